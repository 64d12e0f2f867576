//! # Panel Rendering
//!
//! This module composes the status panel: a large `HH:MM` clock near the top
//! and a `"{temperature} {glyph} {humidity}"` line near the bottom, drawn in
//! the caller's colours onto a [`Panel`] sized to the display.
//!
//! ## Layout
//!
//! ```text
//! +--------------------------------+
//! |            16px                |
//! |           12:34                |  <- FONT_10X20 x3, middle-top anchor
//! |                                |
//! |        21.5°C ☀ 60%            |  <- FONT_10X20 x1, middle-bottom anchor
//! |            10px                |
//! +--------------------------------+
//! ```
//!
//! Both lines centre themselves from measured glyph advances, so any text width
//! works without manual offsets. Nothing wraps; text wider than the panel is
//! clipped by the draw target.
//!
//! The finished image is rotated 180° because the display is mounted upside
//! down.

use crate::colour::{palette_index, PaletteIndex, PanelConfig};
use crate::icons::WeatherIcon;
use crate::panel::{Panel, Scaled};
use crate::StatusData;
use chrono::NaiveTime;
use embedded_graphics::{
    mono_font::{iso_8859_1::FONT_10X20, MonoFont, MonoTextStyle},
    prelude::*,
    primitives::Rectangle,
    text::{renderer::TextRenderer, Alignment, Baseline, Text, TextStyle, TextStyleBuilder},
};
use log::debug;

/// Distance from the panel top to the top of the clock digits.
pub const CLOCK_TOP: i32 = 16;
/// Distance from the panel bottom to the bottom of the status line.
pub const STATUS_BOTTOM: i32 = 10;
/// Magnification of the clock font (20px font -> 60px digits).
pub const CLOCK_SCALE: u32 = 3;

/// Font used for both lines; ISO-8859-1 covers `°`.
const FONT: &MonoFont<'static> = &FONT_10X20;

/// Format the clock as 24-hour `HH:MM`.
pub fn clock_text(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

/// Stateless renderer for one display resolution.
#[derive(Clone, Copy, Debug)]
pub struct PanelRenderer {
    resolution: Size,
}

impl PanelRenderer {
    pub fn new(resolution: Size) -> Self {
        Self { resolution }
    }

    pub fn resolution(&self) -> Size {
        self.resolution
    }

    /// Render the panel in display orientation (rotated 180°).
    pub fn render(&self, time: NaiveTime, status: &StatusData, colours: &PanelConfig) -> Panel {
        self.compose(time, status, colours).rotate_180()
    }

    /// Render the panel in drawing orientation (not rotated).
    pub fn compose(&self, time: NaiveTime, status: &StatusData, colours: &PanelConfig) -> Panel {
        let mut panel = Panel::new(self.resolution, palette_index(colours.background_colour));

        let clock = clock_text(time);
        let line = status.status_line();
        debug!("Composing panel: clock={} status={}", clock, line);

        if let Err(never) = self.draw_clock(&mut panel, &clock, palette_index(colours.time_colour)) {
            match never {}
        }
        if let Err(never) = self.draw_status(&mut panel, &line, palette_index(colours.data_colour)) {
            match never {}
        }

        panel.set_border(palette_index(colours.border_colour));
        panel
    }

    /// Areas the clock and status line may draw into, in drawing orientation.
    ///
    /// Every pixel outside these two rectangles keeps the background colour.
    pub fn text_regions(&self, time: NaiveTime, status: &StatusData) -> [Rectangle; 2] {
        [
            self.clock_region(&clock_text(time)),
            self.status_layout(&status.status_line()).region(),
        ]
    }

    fn clock_origin(&self) -> Point {
        Point::new((self.resolution.width / 2) as i32, CLOCK_TOP)
    }

    fn clock_style() -> (MonoTextStyle<'static, PaletteIndex>, TextStyle) {
        (
            MonoTextStyle::new(FONT, PaletteIndex::BLACK),
            TextStyleBuilder::new()
                .alignment(Alignment::Center)
                .baseline(Baseline::Top)
                .build(),
        )
    }

    fn clock_region(&self, clock: &str) -> Rectangle {
        let (character_style, text_style) = Self::clock_style();
        let logical = Text::with_text_style(clock, Point::zero(), character_style, text_style)
            .bounding_box();
        Rectangle::new(
            self.clock_origin() + logical.top_left * CLOCK_SCALE as i32,
            logical.size * CLOCK_SCALE,
        )
    }

    fn draw_clock<D>(&self, target: &mut D, clock: &str, colour: PaletteIndex) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = PaletteIndex>,
    {
        let (_, text_style) = Self::clock_style();
        let character_style = MonoTextStyle::new(FONT, colour);
        let mut scaled = Scaled::new(target, self.clock_origin(), CLOCK_SCALE);
        Text::with_text_style(clock, Point::zero(), character_style, text_style).draw(&mut scaled)?;
        Ok(())
    }

    fn status_layout<'t>(&self, line: &'t str) -> StatusLayout<'t> {
        StatusLayout::new(line, self.resolution)
    }

    fn draw_status<D>(&self, target: &mut D, line: &str, colour: PaletteIndex) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = PaletteIndex>,
    {
        self.status_layout(line).draw(target, colour)
    }
}

/// One run of the status line: plain text for the font, or a weather icon.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Segment<'t> {
    Text(&'t str),
    Icon(WeatherIcon),
}

/// Status line split into segments and positioned on the panel.
struct StatusLayout<'t> {
    segments: Vec<Segment<'t>>,
    left: i32,
    bottom: i32,
    width: u32,
}

impl<'t> StatusLayout<'t> {
    fn new(line: &'t str, resolution: Size) -> Self {
        let segments = split_segments(line);
        let width: u32 = segments.iter().map(|s| segment_advance(*s)).sum();
        let left = (resolution.width / 2) as i32 - (width / 2) as i32;
        let bottom = resolution.height as i32 - STATUS_BOTTOM;
        Self {
            segments,
            left,
            bottom,
            width,
        }
    }

    /// Bounding area, padded by the icons' stroke overhang.
    fn region(&self) -> Rectangle {
        let height = FONT.character_size.height;
        Rectangle::new(
            Point::new(self.left - 2, self.bottom - height as i32 - 1),
            Size::new(self.width + 4, height + 4),
        )
    }

    fn draw<D>(&self, target: &mut D, colour: PaletteIndex) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = PaletteIndex>,
    {
        let character_style = MonoTextStyle::new(FONT, colour);
        let text_style = TextStyleBuilder::new()
            .alignment(Alignment::Left)
            .baseline(Baseline::Bottom)
            .build();
        let cell_side = FONT.character_size.height;

        let mut x = self.left;
        for segment in &self.segments {
            match *segment {
                Segment::Text(text) => {
                    Text::with_text_style(text, Point::new(x, self.bottom), character_style, text_style)
                        .draw(target)?;
                }
                Segment::Icon(icon) => {
                    let top = self.bottom - cell_side as i32 + 1;
                    let cell = Rectangle::new(Point::new(x, top), Size::new(cell_side, cell_side));
                    icon.draw(target, cell, colour)?;
                }
            }
            x += segment_advance(*segment) as i32;
        }
        Ok(())
    }
}

fn split_segments(line: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut run_start = 0;
    for (offset, ch) in line.char_indices() {
        if let Some(icon) = WeatherIcon::from_glyph(ch) {
            if run_start < offset {
                segments.push(Segment::Text(&line[run_start..offset]));
            }
            segments.push(Segment::Icon(icon));
            run_start = offset + ch.len_utf8();
        }
    }
    if run_start < line.len() {
        segments.push(Segment::Text(&line[run_start..]));
    }
    segments
}

fn segment_advance(segment: Segment<'_>) -> u32 {
    match segment {
        Segment::Text(text) => {
            let style = MonoTextStyle::new(FONT, PaletteIndex::BLACK);
            let metrics = style.measure_string(text, Point::zero(), Baseline::Bottom);
            metrics.next_position.x.max(0) as u32
        }
        Segment::Icon(_) => FONT.character_size.height + FONT.character_spacing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colour::Colour;
    use crate::SensorReading;

    fn status() -> StatusData {
        StatusData {
            temperature: SensorReading {
                value: "21.5".to_string(),
                unit: Some("°C".to_string()),
            },
            humidity: SensorReading {
                value: "60".to_string(),
                unit: Some("%".to_string()),
            },
            weather: "☀",
        }
    }

    fn noon() -> NaiveTime {
        NaiveTime::from_hms_opt(12, 34, 0).unwrap()
    }

    fn black_on_white() -> PanelConfig {
        PanelConfig {
            time_colour: Colour::Black,
            data_colour: Colour::Red,
            border_colour: Colour::Black,
            background_colour: Colour::White,
        }
    }

    #[test]
    fn test_clock_text_is_24_hour() {
        assert_eq!(clock_text(NaiveTime::from_hms_opt(7, 5, 59).unwrap()), "07:05");
        assert_eq!(clock_text(NaiveTime::from_hms_opt(23, 59, 0).unwrap()), "23:59");
        assert_eq!(clock_text(NaiveTime::from_hms_opt(0, 0, 0).unwrap()), "00:00");
    }

    #[test]
    fn test_split_segments_separates_icons() {
        assert_eq!(
            split_segments("21.5°C ☀ 60%"),
            vec![
                Segment::Text("21.5°C "),
                Segment::Icon(WeatherIcon::Sun),
                Segment::Text(" 60%"),
            ]
        );
        assert_eq!(
            split_segments("- ∅ -"),
            vec![
                Segment::Text("- "),
                Segment::Icon(WeatherIcon::Unknown),
                Segment::Text(" -"),
            ]
        );
        assert_eq!(split_segments("☁"), vec![Segment::Icon(WeatherIcon::Cloud)]);
    }

    #[test]
    fn test_panel_has_display_resolution() {
        let renderer = PanelRenderer::new(Size::new(250, 122));
        let panel = renderer.render(noon(), &status(), &black_on_white());
        assert_eq!(panel.width(), 250);
        assert_eq!(panel.height(), 122);
    }

    #[test]
    fn test_background_untouched_outside_text_regions() {
        let renderer = PanelRenderer::new(Size::new(250, 122));
        let panel = renderer.compose(noon(), &status(), &black_on_white());
        let [clock, line] = renderer.text_regions(noon(), &status());

        for y in 0..panel.height() {
            for x in 0..panel.width() {
                let point = Point::new(x as i32, y as i32);
                if clock.contains(point) || line.contains(point) {
                    continue;
                }
                assert_eq!(
                    panel.pixel(x, y),
                    Some(PaletteIndex::WHITE),
                    "pixel ({}, {}) outside text was painted",
                    x,
                    y
                );
            }
        }
    }

    #[test]
    fn test_text_uses_requested_colours() {
        let renderer = PanelRenderer::new(Size::new(250, 122));
        let panel = renderer.compose(noon(), &status(), &black_on_white());
        let [clock, line] = renderer.text_regions(noon(), &status());

        let mut clock_black = 0;
        let mut line_red = 0;
        for y in 0..panel.height() {
            for x in 0..panel.width() {
                let point = Point::new(x as i32, y as i32);
                match panel.pixel(x, y) {
                    Some(PaletteIndex::BLACK) => {
                        assert!(clock.contains(point), "black outside clock at ({}, {})", x, y);
                        clock_black += 1;
                    }
                    Some(PaletteIndex::RED) => {
                        assert!(line.contains(point), "red outside status at ({}, {})", x, y);
                        line_red += 1;
                    }
                    _ => {}
                }
            }
        }
        assert!(clock_black > 0, "clock drew nothing");
        assert!(line_red > 0, "status line drew nothing");
    }

    #[test]
    fn test_clock_is_centred_below_top_offset() {
        let renderer = PanelRenderer::new(Size::new(250, 122));
        let [clock, _] = renderer.text_regions(noon(), &status());

        // 5 characters of 10px at x3
        assert_eq!(clock.size, Size::new(150, 60));
        assert_eq!(clock.top_left.y, CLOCK_TOP);
        let centre = clock.top_left.x + 75;
        assert!((centre - 125).abs() <= CLOCK_SCALE as i32, "clock centred at {}", centre);
    }

    #[test]
    fn test_status_line_is_centred_above_bottom_offset() {
        let renderer = PanelRenderer::new(Size::new(250, 122));
        let layout = renderer.status_layout("21.5°C ☀ 60%");

        // 7 + 4 text characters at 10px plus one 20px icon cell
        assert_eq!(layout.width, 130);
        assert_eq!(layout.left, 125 - 65);
        assert_eq!(layout.bottom, 122 - STATUS_BOTTOM);
    }

    #[test]
    fn test_border_colour_is_recorded() {
        let renderer = PanelRenderer::new(Size::new(250, 122));
        let colours = PanelConfig {
            border_colour: Colour::Red,
            ..black_on_white()
        };
        let panel = renderer.render(noon(), &status(), &colours);
        assert_eq!(panel.border(), PaletteIndex::RED);
    }

    #[test]
    fn test_render_is_rotated_compose() {
        let renderer = PanelRenderer::new(Size::new(212, 104));
        let upright = renderer.compose(noon(), &status(), &black_on_white());
        let rotated = renderer.render(noon(), &status(), &black_on_white());

        assert_eq!(rotated, upright.clone().rotate_180());
        assert_ne!(rotated, upright);
    }

    #[test]
    fn test_render_is_deterministic() {
        let renderer = PanelRenderer::new(Size::new(250, 122));
        let first = renderer.render(noon(), &StatusData::missing(), &black_on_white());
        let second = renderer.render(noon(), &StatusData::missing(), &black_on_white());
        assert_eq!(first, second);
    }

    #[test]
    fn test_overlong_status_is_clipped_not_wrapped() {
        let renderer = PanelRenderer::new(Size::new(100, 60));
        let long = StatusData {
            temperature: SensorReading {
                value: "-1234567890.5".to_string(),
                unit: Some("°C".to_string()),
            },
            ..status()
        };
        let panel = renderer.compose(noon(), &long, &black_on_white());
        assert_eq!(panel.width(), 100);
        assert!(panel.count(PaletteIndex::RED) > 0);
    }
}
