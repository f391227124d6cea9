/*
 *  display/layout.rs
 *
 *  holemon - the hole at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Screen geometry shared by every view
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

use crate::display::traits::FontId;

/// Layout configuration, derived from the panel size
///
/// Views are laid out on an 8 pixel grid: a `Half` line takes two rows, a
/// `Small` line one. A 128x32 panel therefore fits one half line and two
/// small lines, or four small lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutConfig {
    /// Display width in pixels
    pub width: i32,

    /// Display height in pixels
    pub height: i32,

    /// Width of the cycle progress indicator on the right edge
    pub indicator_width: i32,

    /// X position of the clock in the weather view
    pub clock_x: i32,

    /// Gauge rectangle of the progress view
    pub chip: ChipLayout,
}

/// Body of the progress "chip", inclusive corners
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChipLayout {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
    /// Pin count on each side
    pub pins: i32,
    pub pin_length: i32,
    /// Longest activity tick past the pin end
    pub max_tick: i32,
}

impl ChipLayout {
    /// Y of pin `index` (0 based, top to bottom)
    pub fn pin_y(&self, index: i32) -> i32 {
        let span = self.y1 - self.y0;
        self.y0 + span * (index + 1) / (self.pins + 1)
    }
}

impl LayoutConfig {
    pub fn new(width: u32, height: u32) -> Self {
        let width = width as i32;
        let height = height as i32;
        let chip_h = (height - 6).clamp(8, 40);
        let chip_y0 = (height - chip_h) / 2;
        Self {
            width,
            height,
            indicator_width: 1,
            clock_x: 30,
            chip: ChipLayout {
                x0: width - 24,
                y0: chip_y0,
                x1: width - 10,
                y1: chip_y0 + chip_h,
                pins: 3,
                pin_length: 3,
                max_tick: 5,
            },
        }
    }

    /// Top of text row `row` on the 8 pixel grid
    pub fn row(&self, row: i32) -> i32 {
        row * FontId::Small.line_height()
    }

    /// Width left for content once the cycle indicator is reserved
    pub fn content_width(&self) -> i32 {
        self.width - self.indicator_width - 2
    }
}
