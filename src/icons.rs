//! Vector weather icons.
//!
//! The bitmap fonts bundled with `embedded-graphics` only cover Latin-1, so the
//! weather glyphs are drawn from primitives inside a square cell, one icon per
//! glyph character used by [`crate::hass::WEATHER_GLYPHS`].

use embedded_graphics::{
    geometry::Angle,
    prelude::*,
    primitives::{Arc, Circle, Line, Polyline, PrimitiveStyle, Rectangle, Triangle},
};

/// Icon shape behind a weather glyph.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WeatherIcon {
    Moon,
    Cloud,
    Fog,
    Hail,
    Lightning,
    Rain,
    Snow,
    Sun,
    Wind,
    Warning,
    Unknown,
}

impl WeatherIcon {
    /// Icon for a glyph character, `None` for anything the font should draw.
    pub fn from_glyph(glyph: char) -> Option<Self> {
        let icon = match glyph {
            '☾' => WeatherIcon::Moon,
            '☁' => WeatherIcon::Cloud,
            '≡' => WeatherIcon::Fog,
            '⁘' => WeatherIcon::Hail,
            '☇' => WeatherIcon::Lightning,
            '☵' => WeatherIcon::Rain,
            '❆' => WeatherIcon::Snow,
            '☀' => WeatherIcon::Sun,
            '✵' => WeatherIcon::Wind,
            '⚠' => WeatherIcon::Warning,
            '∅' => WeatherIcon::Unknown,
            _ => return None,
        };
        Some(icon)
    }

    /// Draw the icon inside the square `cell`.
    pub fn draw<D>(self, target: &mut D, cell: Rectangle, colour: D::Color) -> Result<(), D::Error>
    where
        D: DrawTarget,
    {
        let side = cell.size.width.min(cell.size.height) as i32;
        let o = cell.top_left;
        // Scale a point given on a 20x20 design grid into the cell.
        let p = |x: i32, y: i32| o + Point::new(x * side / 20, y * side / 20);
        let d = |n: i32| (n * side / 20).max(1) as u32;

        let stroke = PrimitiveStyle::with_stroke(colour, 2);
        let thin = PrimitiveStyle::with_stroke(colour, 1);
        let fill = PrimitiveStyle::with_fill(colour);

        match self {
            WeatherIcon::Sun => {
                Circle::new(p(6, 6), d(9)).into_styled(fill).draw(target)?;
                let rays = [
                    ((10, 0), (10, 3)),
                    ((10, 17), (10, 20)),
                    ((0, 10), (3, 10)),
                    ((17, 10), (20, 10)),
                    ((3, 3), (5, 5)),
                    ((15, 15), (17, 17)),
                    ((3, 17), (5, 15)),
                    ((15, 5), (17, 3)),
                ];
                for ((x0, y0), (x1, y1)) in rays {
                    Line::new(p(x0, y0), p(x1, y1))
                        .into_styled(stroke)
                        .draw(target)?;
                }
            }
            WeatherIcon::Moon => {
                Arc::new(p(3, 2), d(16), Angle::from_degrees(60.0), Angle::from_degrees(240.0))
                    .into_styled(PrimitiveStyle::with_stroke(colour, d(4)))
                    .draw(target)?;
            }
            WeatherIcon::Cloud => draw_cloud(target, p(0, 3), side, colour)?,
            WeatherIcon::Fog => {
                for y in [5, 10, 15] {
                    Line::new(p(2, y), p(18, y)).into_styled(stroke).draw(target)?;
                }
            }
            WeatherIcon::Hail => {
                for (x, y) in [(9, 2), (3, 8), (15, 8), (9, 14)] {
                    Circle::new(p(x, y), d(4)).into_styled(fill).draw(target)?;
                }
            }
            WeatherIcon::Lightning => {
                let bolt = [p(12, 0), p(5, 11), p(11, 11), p(7, 20), p(16, 8), p(10, 8), p(14, 0)];
                Polyline::new(&bolt).into_styled(stroke).draw(target)?;
            }
            WeatherIcon::Rain => {
                // Trigram: broken, solid, broken
                for y in [4, 16] {
                    Line::new(p(2, y), p(8, y)).into_styled(stroke).draw(target)?;
                    Line::new(p(12, y), p(18, y)).into_styled(stroke).draw(target)?;
                }
                Line::new(p(2, 10), p(18, 10)).into_styled(stroke).draw(target)?;
            }
            WeatherIcon::Snow => {
                for ((x0, y0), (x1, y1)) in [((10, 1), (10, 19)), ((2, 5), (18, 15)), ((2, 15), (18, 5))] {
                    Line::new(p(x0, y0), p(x1, y1)).into_styled(stroke).draw(target)?;
                }
                Circle::new(p(7, 7), d(6)).into_styled(thin).draw(target)?;
            }
            WeatherIcon::Wind => {
                let spokes = [
                    ((10, 0), (10, 20)),
                    ((0, 10), (20, 10)),
                    ((3, 3), (17, 17)),
                    ((3, 17), (17, 3)),
                ];
                for ((x0, y0), (x1, y1)) in spokes {
                    Line::new(p(x0, y0), p(x1, y1)).into_styled(thin).draw(target)?;
                }
                Circle::new(p(7, 7), d(6)).into_styled(fill).draw(target)?;
            }
            WeatherIcon::Warning => {
                Triangle::new(p(10, 1), p(1, 19), p(19, 19))
                    .into_styled(stroke)
                    .draw(target)?;
                Line::new(p(10, 7), p(10, 13)).into_styled(stroke).draw(target)?;
                Rectangle::new(p(9, 15), Size::new(d(2), d(2)))
                    .into_styled(fill)
                    .draw(target)?;
            }
            WeatherIcon::Unknown => {
                Circle::new(p(3, 3), d(14)).into_styled(stroke).draw(target)?;
                Line::new(p(2, 18), p(18, 2)).into_styled(stroke).draw(target)?;
            }
        }
        Ok(())
    }
}

fn draw_cloud<D>(target: &mut D, top_left: Point, side: i32, colour: D::Color) -> Result<(), D::Error>
where
    D: DrawTarget,
{
    let p = |x: i32, y: i32| top_left + Point::new(x * side / 20, y * side / 20);
    let d = |n: i32| (n * side / 20).max(1) as u32;
    let fill = PrimitiveStyle::with_fill(colour);

    Circle::new(p(1, 6), d(8)).into_styled(fill).draw(target)?;
    Circle::new(p(5, 0), d(11)).into_styled(fill).draw(target)?;
    Circle::new(p(11, 4), d(9)).into_styled(fill).draw(target)?;
    Rectangle::new(p(5, 9), Size::new(d(11), d(5)))
        .into_styled(fill)
        .draw(target)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colour::PaletteIndex;
    use crate::hass::{FALLBACK_GLYPH, WEATHER_GLYPHS};
    use crate::panel::Panel;

    #[test]
    fn test_every_table_glyph_has_an_icon() {
        for (code, glyph) in WEATHER_GLYPHS.iter().chain([("", FALLBACK_GLYPH)].iter()) {
            let mut chars = glyph.chars();
            let ch = chars.next().unwrap();
            assert!(chars.next().is_none(), "glyph for {} is one char", code);
            assert!(WeatherIcon::from_glyph(ch).is_some(), "no icon for {}", glyph);
        }
    }

    #[test]
    fn test_text_characters_have_no_icon() {
        for ch in ['2', '°', '%', '-', ' ', 'C'] {
            assert_eq!(WeatherIcon::from_glyph(ch), None);
        }
    }

    #[test]
    fn test_icons_stay_inside_their_cell() {
        let cell = Rectangle::new(Point::new(10, 10), Size::new(20, 20));
        for glyph in ['☾', '☁', '≡', '⁘', '☇', '☵', '❆', '☀', '✵', '⚠', '∅'] {
            let mut panel = Panel::new(Size::new(50, 50), PaletteIndex::WHITE);
            WeatherIcon::from_glyph(glyph)
                .unwrap()
                .draw(&mut panel, cell, PaletteIndex::BLACK)
                .unwrap();

            let mut inside = 0;
            for y in 0..50 {
                for x in 0..50 {
                    if panel.pixel(x, y) == Some(PaletteIndex::BLACK) {
                        // Strokes may spill one pixel past the grid edge
                        assert!((8..=32).contains(&x) && (8..=32).contains(&y), "{} leaks", glyph);
                        inside += 1;
                    }
                }
            }
            assert!(inside > 0, "{} drew nothing", glyph);
        }
    }
}
