//! # Display Output
//!
//! A [`PanelDisplay`] is anything that can show a finished [`Panel`]: the
//! Waveshare e-paper driver on a Pi, or [`TerminalDisplay`] for development on
//! a desktop. [`present`] drives one full refresh in the order the hardware
//! expects: border, image, refresh.

use crate::colour::{Palette, PaletteIndex};
use crate::panel::Panel;
use embedded_graphics::prelude::Size;
use log::info;
use std::io::{self, Write};

/// Output stage for rendered panels.
pub trait PanelDisplay {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Native resolution the panel must be rendered at.
    fn resolution(&self) -> Size;

    /// Colours the display can physically show.
    fn palette(&self) -> Palette;

    fn set_border(&mut self, colour: PaletteIndex) -> Result<(), Self::Error>;

    fn set_image(&mut self, panel: &Panel) -> Result<(), Self::Error>;

    /// Push the buffered image to the glass.
    fn show(&mut self) -> Result<(), Self::Error>;
}

/// Show `panel` on `display`: set border, set image, refresh.
pub fn present<D: PanelDisplay>(display: &mut D, panel: &Panel) -> Result<(), D::Error> {
    display.set_border(panel.border())?;
    display.set_image(panel)?;
    display.show()?;
    info!("Panel presented ({}x{})", panel.width(), panel.height());
    Ok(())
}

/// ASCII preview of the panel for development without hardware.
///
/// White is `' '`, black `'#'` and red `'+'`. Every other row is printed so
/// the preview keeps roughly the panel's aspect ratio in a terminal.
pub struct TerminalDisplay<W: Write> {
    out: W,
    resolution: Size,
    palette: Palette,
    border: PaletteIndex,
    image: Option<Panel>,
}

impl TerminalDisplay<io::Stdout> {
    pub fn stdout(resolution: Size, palette: Palette) -> Self {
        Self::new(io::stdout(), resolution, palette)
    }
}

impl<W: Write> TerminalDisplay<W> {
    pub fn new(out: W, resolution: Size, palette: Palette) -> Self {
        Self {
            out,
            resolution,
            palette,
            border: PaletteIndex::WHITE,
            image: None,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

fn ascii(colour: PaletteIndex) -> char {
    match colour {
        PaletteIndex::BLACK => '#',
        PaletteIndex::RED => '+',
        _ => ' ',
    }
}

impl<W: Write> PanelDisplay for TerminalDisplay<W> {
    type Error = io::Error;

    fn resolution(&self) -> Size {
        self.resolution
    }

    fn palette(&self) -> Palette {
        self.palette
    }

    fn set_border(&mut self, colour: PaletteIndex) -> Result<(), io::Error> {
        self.border = colour;
        Ok(())
    }

    fn set_image(&mut self, panel: &Panel) -> Result<(), io::Error> {
        self.image = Some(panel.clone());
        Ok(())
    }

    fn show(&mut self) -> Result<(), io::Error> {
        let Some(panel) = &self.image else {
            return Err(io::Error::other("no image set"));
        };

        let edge = ascii(self.border);
        let edge = if edge == ' ' { '.' } else { edge };
        let frame: String = std::iter::repeat(edge)
            .take(panel.width() as usize + 2)
            .collect();

        writeln!(self.out, "{}", frame)?;
        for row in panel.rows().step_by(2) {
            let line: String = row.iter().map(|&p| ascii(p)).collect();
            writeln!(self.out, "{}{}{}", edge, line, edge)?;
        }
        writeln!(self.out, "{}", frame)?;
        self.out.flush()
    }
}
