/*
 *  display/surface.rs
 *
 *  holemon - the hole at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Drawing surface backed by an in-memory framebuffer and a panel driver
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

use embedded_graphics::{
    image::{Image, ImageRaw},
    mono_font::MonoTextStyle,
    pixelcolor::BinaryColor,
    prelude::*,
    primitives::{Line, PrimitiveStyle, Rectangle},
    text::{Baseline, Text},
};

use crate::display::error::DisplayError;
use crate::display::factory::BoxedDriver;
use crate::display::traits::{Bitmap, DrawingSurface, FontId};
use crate::vframebuf::VarFrameBuf;

/// Frames are composed in a `VarFrameBuf` and handed to the driver packed
/// on `present`.
pub struct FrameSurface {
    driver: BoxedDriver,
    framebuffer: VarFrameBuf<BinaryColor>,
}

impl FrameSurface {
    pub fn new(driver: BoxedDriver) -> Self {
        let (width, height) = driver.dimensions();
        Self {
            driver,
            framebuffer: VarFrameBuf::new(width, height, BinaryColor::Off),
        }
    }

    /// The composed frame, for inspection
    pub fn framebuffer(&self) -> &VarFrameBuf<BinaryColor> {
        &self.framebuffer
    }
}

impl DrawingSurface for FrameSurface {
    fn size(&self) -> (u32, u32) {
        (self.framebuffer.width() as u32, self.framebuffer.height() as u32)
    }

    fn clear(&mut self) -> Result<(), DisplayError> {
        self.framebuffer.clear_color(BinaryColor::Off);
        Ok(())
    }

    fn draw_text(&mut self, x: i32, y: i32, text: &str, font: FontId) -> Result<(), DisplayError> {
        let style = MonoTextStyle::new(font.mono_font(), BinaryColor::On);
        Text::with_baseline(text, Point::new(x, y), style, Baseline::Top)
            .draw(&mut self.framebuffer)
            .map_err(|e| DisplayError::Draw(format!("{:?}", e)))?;
        Ok(())
    }

    fn draw_rect(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, filled: bool) -> Result<(), DisplayError> {
        let style = if filled {
            PrimitiveStyle::with_fill(BinaryColor::On)
        } else {
            PrimitiveStyle::with_stroke(BinaryColor::On, 1)
        };
        let (left, right) = (x0.min(x1), x0.max(x1));
        let (top, bottom) = (y0.min(y1), y0.max(y1));
        Rectangle::with_corners(Point::new(left, top), Point::new(right, bottom))
            .into_styled(style)
            .draw(&mut self.framebuffer)
            .map_err(|e| DisplayError::Draw(format!("{:?}", e)))
    }

    fn draw_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32) -> Result<(), DisplayError> {
        Line::new(Point::new(x0, y0), Point::new(x1, y1))
            .into_styled(PrimitiveStyle::with_stroke(BinaryColor::On, 1))
            .draw(&mut self.framebuffer)
            .map_err(|e| DisplayError::Draw(format!("{:?}", e)))
    }

    fn draw_bitmap(&mut self, x: i32, y: i32, bitmap: &Bitmap) -> Result<(), DisplayError> {
        let stride = (bitmap.width as usize).div_ceil(8);
        if bitmap.data.len() != stride * bitmap.height as usize {
            return Err(DisplayError::FrameSize {
                expected: stride * bitmap.height as usize,
                actual: bitmap.data.len(),
            });
        }
        let raw = ImageRaw::<BinaryColor>::new(bitmap.data, bitmap.width);
        Image::new(&raw, Point::new(x, y))
            .draw(&mut self.framebuffer)
            .map_err(|e| DisplayError::Draw(format!("{:?}", e)))
    }

    fn present(&mut self) -> Result<(), DisplayError> {
        let packed = self.framebuffer.to_packed();
        self.driver.write_buffer(&packed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::drivers::mock::MockDriver;

    fn surface() -> (FrameSurface, MockDriver) {
        let driver = MockDriver::new_with_size(128, 32).unwrap();
        (FrameSurface::new(Box::new(driver.clone())), driver)
    }

    #[test]
    fn test_present_reaches_driver() {
        let (mut surface, driver) = surface();
        surface.draw_rect(0, 0, 3, 1, true).unwrap();
        assert_eq!(driver.count_on_pixels(), 0);

        surface.present().unwrap();
        assert_eq!(driver.count_on_pixels(), 8);
        assert_eq!(driver.get_pixel(3, 1), Some(true));
        assert_eq!(driver.get_pixel(4, 1), Some(false));
    }

    #[test]
    fn test_outline_rect_leaves_inside_clear() {
        let (mut surface, _) = surface();
        surface.draw_rect(10, 10, 14, 14, false).unwrap();
        assert_eq!(surface.framebuffer().get(12, 12), Some(BinaryColor::Off));
        assert_eq!(surface.framebuffer().get(10, 12), Some(BinaryColor::On));
        assert_eq!(surface.framebuffer().count_on(), 16);
    }

    #[test]
    fn test_text_draws_and_measures() {
        let (mut surface, _) = surface();
        assert_eq!(surface.measure_text_width("abcd", FontId::Small), 20);
        assert_eq!(surface.measure_text_width("", FontId::Half), 0);
        surface.draw_text(0, 0, "CPU", FontId::Half).unwrap();
        assert!(surface.framebuffer().count_on() > 0);
    }

    #[test]
    fn test_offscreen_text_is_clipped() {
        let (mut surface, _) = surface();
        surface.draw_text(-500, 0, "gone", FontId::Small).unwrap();
        surface.draw_text(0, 100, "gone", FontId::Small).unwrap();
        assert_eq!(surface.framebuffer().count_on(), 0);
    }

    #[test]
    fn test_bitmap_size_checked() {
        static DATA: [u8; 2] = [0xFF, 0x00];
        let (mut surface, _) = surface();
        let ok = Bitmap { data: &DATA, width: 8, height: 2 };
        surface.draw_bitmap(0, 0, &ok).unwrap();
        assert_eq!(surface.framebuffer().count_on(), 8);

        let bad = Bitmap { data: &DATA, width: 8, height: 3 };
        assert!(surface.draw_bitmap(0, 0, &bad).is_err());
    }

    #[test]
    fn test_clear_blanks_frame() {
        let (mut surface, _) = surface();
        surface.draw_line(0, 0, 10, 0).unwrap();
        assert_eq!(surface.framebuffer().count_on(), 11);
        surface.clear().unwrap();
        assert_eq!(surface.framebuffer().count_on(), 0);
    }
}
