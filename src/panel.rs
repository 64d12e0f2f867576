//! Indexed-colour pixel buffer for one rendered panel.
//!
//! [`Panel`] is an `embedded-graphics` draw target, so fonts and primitives
//! draw straight into it. Pixels outside the buffer are silently clipped.

use crate::colour::PaletteIndex;
use embedded_graphics::{pixelcolor::PixelColor, prelude::*, primitives::Rectangle};
use std::convert::Infallible;

/// A finished (or in-progress) panel image.
///
/// Pixels are stored row-major. The border colour is recorded alongside the
/// image so the display can apply it before the image is shown.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Panel {
    width: u32,
    height: u32,
    pixels: Vec<PaletteIndex>,
    border: PaletteIndex,
}

impl Panel {
    /// Blank panel filled with `background`. The border defaults to the
    /// background until [`Panel::set_border`] is called.
    pub fn new(size: Size, background: PaletteIndex) -> Self {
        let len = (size.width * size.height) as usize;
        Self {
            width: size.width,
            height: size.height,
            pixels: vec![background; len],
            border: background,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn border(&self) -> PaletteIndex {
        self.border
    }

    pub fn set_border(&mut self, border: PaletteIndex) {
        self.border = border;
    }

    /// Pixel at `(x, y)`, or `None` outside the panel.
    pub fn pixel(&self, x: u32, y: u32) -> Option<PaletteIndex> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get((y * self.width + x) as usize).copied()
    }

    /// Rows of pixels, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[PaletteIndex]> {
        self.pixels.chunks(self.width.max(1) as usize)
    }

    /// Number of pixels holding `colour`.
    pub fn count(&self, colour: PaletteIndex) -> usize {
        self.pixels.iter().filter(|&&p| p == colour).count()
    }

    /// Rotate the image by 180 degrees.
    ///
    /// For a row-major buffer a half turn maps `(x, y)` to
    /// `(w - 1 - x, h - 1 - y)`, which is exactly the reversed pixel order.
    pub fn rotate_180(mut self) -> Self {
        self.pixels.reverse();
        self
    }

    fn set(&mut self, point: Point, colour: PaletteIndex) {
        if point.x < 0 || point.y < 0 {
            return;
        }
        let (x, y) = (point.x as u32, point.y as u32);
        if x < self.width && y < self.height {
            self.pixels[(y * self.width + x) as usize] = colour;
        }
    }
}

impl OriginDimensions for Panel {
    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl DrawTarget for Panel {
    type Color = PaletteIndex;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, colour) in pixels {
            self.set(point, colour);
        }
        Ok(())
    }
}

/// Draw target adapter that magnifies every pixel into a `scale`×`scale`
/// block, offset by `origin` in the wrapped target.
///
/// Used to draw the clock with a bitmap font at several times its native size.
pub struct Scaled<'a, D> {
    target: &'a mut D,
    origin: Point,
    scale: u32,
}

impl<'a, D> Scaled<'a, D> {
    pub fn new(target: &'a mut D, origin: Point, scale: u32) -> Self {
        Self {
            target,
            origin,
            scale: scale.max(1),
        }
    }
}

impl<D: Dimensions> Dimensions for Scaled<'_, D> {
    fn bounding_box(&self) -> Rectangle {
        let outer = self.target.bounding_box();
        let scale = self.scale as i32;
        let top_left = Point::new(
            (outer.top_left.x - self.origin.x).div_euclid(scale),
            (outer.top_left.y - self.origin.y).div_euclid(scale),
        );
        Rectangle::new(top_left, outer.size / self.scale + Size::new(1, 1))
    }
}

impl<C, D> DrawTarget for Scaled<'_, D>
where
    C: PixelColor,
    D: DrawTarget<Color = C>,
{
    type Color = C;
    type Error = D::Error;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let scale = self.scale;
        let origin = self.origin;
        for Pixel(point, colour) in pixels {
            let block = Rectangle::new(origin + point * scale as i32, Size::new(scale, scale));
            self.target.fill_solid(&block, colour)?;
        }
        Ok(())
    }
}
