//! # Colour Roles and Native Palette
//!
//! Users choose colours by name (`WHITE`, `BLACK`, `RED`) for each part of the
//! panel. Rendering works in *palette indices*: the small integers the e-paper
//! controller understands. The two are kept apart so the abstract choice never
//! leaks the backend representation:
//!
//! - [`Colour`]: what the user asked for (parsed case-insensitively)
//! - [`PaletteIndex`]: what gets written into a [`crate::panel::Panel`]
//! - [`palette_index`]: the pure, total mapping between them
//!
//! `PaletteIndex` has no public constructor, so every index in a rendered panel
//! came from a `Colour` and is within the panel's three-colour palette.

use embedded_graphics::pixelcolor::PixelColor;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A colour role value selectable on the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Colour {
    White,
    Black,
    Red,
}

impl Colour {
    /// Every selectable colour, in palette order.
    pub const ALL: [Colour; 3] = [Colour::White, Colour::Black, Colour::Red];

    pub fn name(self) -> &'static str {
        match self {
            Colour::White => "WHITE",
            Colour::Black => "BLACK",
            Colour::Red => "RED",
        }
    }
}

impl fmt::Display for Colour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("unknown colour '{0}' (expected one of: white, black, red)")]
pub struct ColourError(pub String);

impl FromStr for Colour {
    type Err = ColourError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Colour::ALL
            .into_iter()
            .find(|colour| colour.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ColourError(s.to_string()))
    }
}

/// Native colour index of the display controller.
///
/// Values follow the Inky/Waveshare ordering: 0 = white, 1 = black, 2 = red.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PaletteIndex(u8);

impl PaletteIndex {
    pub const WHITE: PaletteIndex = PaletteIndex(0);
    pub const BLACK: PaletteIndex = PaletteIndex(1);
    pub const RED: PaletteIndex = PaletteIndex(2);

    pub fn value(self) -> u8 {
        self.0
    }
}

impl PixelColor for PaletteIndex {
    type Raw = ();
}

/// Map a colour role onto the display's native palette.
pub fn palette_index(colour: Colour) -> PaletteIndex {
    match colour {
        Colour::White => PaletteIndex::WHITE,
        Colour::Black => PaletteIndex::BLACK,
        Colour::Red => PaletteIndex::RED,
    }
}

/// Colour capability of a physical display.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Palette {
    /// Black and white only
    Black,
    /// Black, white and red
    Red,
}

impl Palette {
    pub fn supports(self, colour: Colour) -> bool {
        match self {
            Palette::Black => colour != Colour::Red,
            Palette::Red => true,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Palette::Black => "black",
            Palette::Red => "red",
        }
    }
}

impl fmt::Display for Palette {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Colours chosen for one render call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PanelConfig {
    pub time_colour: Colour,
    pub data_colour: Colour,
    pub border_colour: Colour,
    pub background_colour: Colour,
}

impl Default for PanelConfig {
    fn default() -> Self {
        PanelConfig {
            time_colour: Colour::Black,
            data_colour: Colour::Red,
            border_colour: Colour::Black,
            background_colour: Colour::White,
        }
    }
}

impl PanelConfig {
    /// First colour role the palette cannot show, if any.
    pub fn unsupported_by(&self, palette: Palette) -> Option<(&'static str, Colour)> {
        [
            ("time", self.time_colour),
            ("data", self.data_colour),
            ("border", self.border_colour),
            ("background", self.background_colour),
        ]
        .into_iter()
        .find(|(_, colour)| !palette.supports(*colour))
    }
}
