/*
 *  vframebuf.rs
 *
 *  holemon - the hole at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Runtime sized framebuffer, the canvas every frame is composed on
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use core::convert::Infallible;
use embedded_graphics::geometry::{OriginDimensions, Size};
use embedded_graphics::pixelcolor::{BinaryColor, PixelColor};
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PointsIter, Rectangle};

/// A runtime-sized framebuffer for embedded-graphics.
///
/// Every write is clipped to the buffer, so callers may draw partially
/// off screen (scrolling text relies on this).
#[derive(Debug, Clone)]
pub struct VarFrameBuf<C: PixelColor> {
    buf: Vec<C>,
    w: usize,
    h: usize,
}

impl<C: PixelColor + Clone> VarFrameBuf<C> {
    pub fn new(width: u32, height: u32, fill: C) -> Self {
        let (w, h) = (width as usize, height as usize);
        Self { buf: vec![fill; w * h], w, h }
    }

    pub fn width(&self) -> usize { self.w }
    pub fn height(&self) -> usize { self.h }

    /// Immutable raw access, row major
    pub fn as_slice(&self) -> &[C] { &self.buf }

    /// Clear to a color
    pub fn clear_color(&mut self, color: C) {
        self.buf.fill(color);
    }

    /// Color at (x, y), None when out of bounds
    pub fn get(&self, x: i32, y: i32) -> Option<C> {
        self.idx(Point::new(x, y)).map(|i| self.buf[i])
    }

    /// Map (x,y) to linear index; returns None if out of bounds
    #[inline]
    fn idx(&self, p: Point) -> Option<usize> {
        if p.x >= 0 && p.y >= 0 {
            let (x, y) = (p.x as usize, p.y as usize);
            if x < self.w && y < self.h {
                return Some(y * self.w + x);
            }
        }
        None
    }

    /// Intersection of `area` with the buffer as (x0, y0, x1, y1), exclusive end
    fn clip(&self, area: &Rectangle) -> Option<(usize, usize, usize, usize)> {
        let x0 = area.top_left.x.max(0) as i64;
        let y0 = area.top_left.y.max(0) as i64;
        let x1 = (area.top_left.x as i64 + area.size.width as i64).min(self.w as i64);
        let y1 = (area.top_left.y as i64 + area.size.height as i64).min(self.h as i64);
        if x0 >= x1 || y0 >= y1 {
            return None;
        }
        Some((x0 as usize, y0 as usize, x1 as usize, y1 as usize))
    }
}

impl VarFrameBuf<BinaryColor> {
    /// Pack into bytes, 8 pixels per byte, LSB first, row major
    pub fn to_packed(&self) -> Vec<u8> {
        let mut out = vec![0u8; self.buf.len().div_ceil(8)];
        for (i, px) in self.buf.iter().enumerate() {
            if px.is_on() {
                out[i / 8] |= 1 << (i % 8);
            }
        }
        out
    }

    pub fn count_on(&self) -> usize {
        self.buf.iter().filter(|px| px.is_on()).count()
    }
}

impl<C: PixelColor> OriginDimensions for VarFrameBuf<C> {
    fn size(&self) -> Size {
        Size::new(self.w as u32, self.h as u32)
    }
}

impl<C: PixelColor + Clone> DrawTarget for VarFrameBuf<C> {
    type Color = C;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(p, c) in pixels {
            if let Some(i) = self.idx(p) {
                self.buf[i] = c;
            }
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.clear_color(color);
        Ok(())
    }

    fn fill_contiguous<I>(&mut self, area: &Rectangle, colors: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Self::Color>,
    {
        // colors are in row major order over the whole area, walk the
        // area's points alongside and drop the ones off screen
        for (p, c) in area.points().zip(colors) {
            if let Some(i) = self.idx(p) {
                self.buf[i] = c;
            }
        }
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        if let Some((x0, y0, x1, y1)) = self.clip(area) {
            for y in y0..y1 {
                let base = y * self.w;
                self.buf[base + x0..base + x1].fill(color);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::primitives::{PrimitiveStyle, StyledDrawable};

    #[test]
    fn test_partially_offscreen_fill_is_clipped() {
        let mut fb = VarFrameBuf::new(16, 8, BinaryColor::Off);
        let rect = Rectangle::new(Point::new(-4, -4), Size::new(8, 8));
        rect.draw_styled(&PrimitiveStyle::with_fill(BinaryColor::On), &mut fb).unwrap();
        // only the 4x4 on screen quarter lands
        assert_eq!(fb.count_on(), 16);
        assert_eq!(fb.get(3, 3), Some(BinaryColor::On));
        assert_eq!(fb.get(4, 0), Some(BinaryColor::Off));
    }

    #[test]
    fn test_contiguous_fill_does_not_wrap_rows() {
        let mut fb = VarFrameBuf::new(8, 4, BinaryColor::Off);
        let area = Rectangle::new(Point::new(6, 0), Size::new(4, 1));
        fb.fill_contiguous(&area, core::iter::repeat(BinaryColor::On)).unwrap();
        assert_eq!(fb.count_on(), 2);
        assert_eq!(fb.get(0, 1), Some(BinaryColor::Off));
    }

    #[test]
    fn test_pack_lsb_first() {
        let mut fb = VarFrameBuf::new(16, 1, BinaryColor::Off);
        fb.draw_iter([Pixel(Point::new(0, 0), BinaryColor::On), Pixel(Point::new(9, 0), BinaryColor::On)]).unwrap();
        assert_eq!(fb.to_packed(), vec![0b0000_0001, 0b0000_0010]);
    }
}
