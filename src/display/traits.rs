/*
 *  display/traits.rs
 *
 *  holemon - the hole at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Core trait definitions for the display driver and drawing surface
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

use embedded_graphics::mono_font::{iso_8859_1, MonoFont};
use crate::display::error::DisplayError;

/// Display capabilities and metadata
#[derive(Debug, Clone)]
pub struct DisplayCapabilities {
    /// Display width in pixels
    pub width: u32,

    /// Display height in pixels
    pub height: u32,

    /// Whether the display supports hardware rotation
    pub supports_rotation: bool,

    /// Maximum recommended frame rate
    pub max_fps: u32,

    /// Whether the display supports brightness control
    pub supports_brightness: bool,

    /// Whether the display supports inversion
    pub supports_invert: bool,
}

/// Minimal hardware abstraction - all display drivers must implement this trait
///
/// Drivers receive fully composed frames as packed bytes (8 pixels per
/// byte, LSB first, row major) and push them to the panel.
pub trait DisplayDriver: Send {
    /// Returns the capabilities of this display
    fn capabilities(&self) -> &DisplayCapabilities;

    /// Returns the display dimensions as (width, height)
    fn dimensions(&self) -> (u32, u32) {
        let caps = self.capabilities();
        (caps.width, caps.height)
    }

    /// Initialize the display hardware
    fn init(&mut self) -> Result<(), DisplayError>;

    /// Set display brightness (0-255)
    fn set_brightness(&mut self, value: u8) -> Result<(), DisplayError>;

    /// Flush the current panel buffer to the display hardware
    fn flush(&mut self) -> Result<(), DisplayError>;

    /// Clear the display to blank/off state
    fn clear(&mut self) -> Result<(), DisplayError>;

    /// Write a packed frame to the display and flush it
    fn write_buffer(&mut self, buffer: &[u8]) -> Result<(), DisplayError>;

    /// Set display inversion (if supported)
    fn set_invert(&mut self, _inverted: bool) -> Result<(), DisplayError> {
        Err(DisplayError::Unsupported("inversion"))
    }

    /// Set display rotation (if supported)
    ///
    /// Rotation angle should be 0, 90, 180, or 270 degrees.
    fn set_rotation(&mut self, degrees: u16) -> Result<(), DisplayError> {
        if !self.capabilities().supports_rotation {
            return Err(DisplayError::Unsupported("rotation"));
        }
        if degrees != 0 && degrees != 90 && degrees != 180 && degrees != 270 {
            return Err(DisplayError::InvalidRotation(degrees));
        }
        Err(DisplayError::Unsupported("rotation"))
    }
}

/// Fonts available to the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontId {
    /// 8 pixel line, used for detail lines
    Small,
    /// 16 pixel line, used for headlines and the clock
    Half,
}

impl FontId {
    pub fn mono_font(&self) -> &'static MonoFont<'static> {
        match self {
            FontId::Small => &iso_8859_1::FONT_5X8,
            FontId::Half => &iso_8859_1::FONT_9X15,
        }
    }

    /// Nominal line height the layout reserves for this font
    pub fn line_height(&self) -> i32 {
        match self {
            FontId::Small => 8,
            FontId::Half => 16,
        }
    }
}

/// A 1bpp bitmap, rows padded to whole bytes, MSB first
#[derive(Debug, Clone, Copy)]
pub struct Bitmap {
    pub data: &'static [u8],
    pub width: u32,
    pub height: u32,
}

/// Everything the display engine needs to compose a frame.
///
/// Coordinates are pixels with the origin top left; rectangles and lines
/// include both corner points. Anything outside the panel is clipped.
pub trait DrawingSurface: Send {
    /// Panel size as (width, height)
    fn size(&self) -> (u32, u32);

    /// Blank the frame
    fn clear(&mut self) -> Result<(), DisplayError>;

    /// Draw `text` with its top left corner at (x, y)
    fn draw_text(&mut self, x: i32, y: i32, text: &str, font: FontId) -> Result<(), DisplayError>;

    /// Width of `text` in pixels when drawn with `font`
    fn measure_text_width(&self, text: &str, font: FontId) -> u32 {
        let font = font.mono_font();
        let chars = text.chars().count() as u32;
        chars * font.character_size.width + chars.saturating_sub(1) * font.character_spacing
    }

    fn draw_rect(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, filled: bool) -> Result<(), DisplayError>;

    fn draw_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32) -> Result<(), DisplayError>;

    fn draw_bitmap(&mut self, x: i32, y: i32, bitmap: &Bitmap) -> Result<(), DisplayError>;

    /// Push the composed frame to the panel
    fn present(&mut self) -> Result<(), DisplayError>;
}
