/*
 *  display/components/chip.rs
 *
 *  holemon - the hole at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Progress gauge drawn as a chip filling up, pins flickering while busy
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

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::display::error::DisplayError;
use crate::display::layout::ChipLayout;
use crate::display::traits::DrawingSurface;

/// One in this many frames a pin shows activity
const TICK_ODDS: u32 = 6;

pub struct ChipGauge {
    rng: StdRng,
}

impl ChipGauge {
    pub const DEFAULT_SEED: u64 = 0x5EED_C41F;

    pub fn new(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed) }
    }

    /// Draw the chip with its body filled from the bottom to `fill` (0..=1).
    /// `busy` adds random activity ticks beyond the pins.
    pub fn draw<S: DrawingSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        chip: &ChipLayout,
        fill: f32,
        busy: bool,
    ) -> Result<(), DisplayError> {
        surface.draw_rect(chip.x0, chip.y0, chip.x1, chip.y1, false)?;

        let inner_h = chip.y1 - chip.y0 - 3;
        let fill = if fill.is_finite() { fill.clamp(0.0, 1.0) } else { 0.0 };
        let filled = (fill * inner_h as f32).round() as i32;
        if filled > 0 {
            let bottom = chip.y1 - 2;
            surface.draw_rect(chip.x0 + 2, bottom - filled + 1, chip.x1 - 2, bottom, true)?;
        }

        for pin in 0..chip.pins {
            let y = chip.pin_y(pin);
            surface.draw_line(chip.x0 - chip.pin_length, y, chip.x0 - 1, y)?;
            surface.draw_line(chip.x1 + 1, y, chip.x1 + chip.pin_length, y)?;

            if !busy {
                continue;
            }
            if let Some(len) = self.activity(chip.max_tick) {
                let end = chip.x0 - chip.pin_length - 2;
                surface.draw_line(end - len + 1, y, end, y)?;
            }
            if let Some(len) = self.activity(chip.max_tick) {
                let start = chip.x1 + chip.pin_length + 2;
                surface.draw_line(start, y, start + len - 1, y)?;
            }
        }
        Ok(())
    }

    /// Length of this frame's tick on one pin, if it fires
    fn activity(&mut self, max_tick: i32) -> Option<i32> {
        if self.rng.random_range(0..TICK_ODDS) != 0 {
            return None;
        }
        Some(self.rng.random_range(1..=max_tick.max(1)))
    }
}
