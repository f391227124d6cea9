/*
 *  display/components/gauge.rs
 *
 *  holemon - the hole at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Bar gauges and the cycle dwell indicator
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

use crate::display::error::DisplayError;
use crate::display::layout::LayoutConfig;
use crate::display::traits::DrawingSurface;

/// Outlined horizontal bar with origin (x, y) and size (w, h), filled to
/// `fraction` (clamped to 0..=1) with a one pixel gap inside the outline.
pub fn draw_hbar<S: DrawingSurface + ?Sized>(
    surface: &mut S,
    x: i32,
    y: i32,
    w: i32,
    h: i32,
    fraction: f32,
) -> Result<(), DisplayError> {
    if w < 1 || h < 1 {
        return Ok(());
    }
    let (x2, y2) = (x + w - 1, y + h - 1);
    surface.draw_rect(x, y, x2, y2, false)?;

    let fraction = if fraction.is_finite() { fraction.clamp(0.0, 1.0) } else { 0.0 };
    let fill_end = x + (fraction * (w - 2) as f32) as i32;
    if fill_end >= x + 2 && y2 - 2 >= y + 2 {
        surface.draw_rect(x + 2, y + 2, fill_end.min(x2 - 2), y2 - 2, true)?;
    }
    Ok(())
}

/// Thin vertical bar in the bottom right corner, grows upward with `progress`
pub fn draw_cycle_indicator<S: DrawingSurface + ?Sized>(
    surface: &mut S,
    layout: &LayoutConfig,
    progress: f32,
) -> Result<(), DisplayError> {
    let progress = if progress.is_finite() { progress.clamp(0.0, 1.0) } else { 0.0 };
    let filled = (layout.height as f32 * progress) as i32;
    if filled < 1 {
        return Ok(());
    }
    let x0 = layout.width - layout.indicator_width;
    surface.draw_rect(x0, layout.height - filled, layout.width - 1, layout.height - 1, true)
}
