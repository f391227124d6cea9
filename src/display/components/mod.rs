/*
 *  display/components/mod.rs
 *
 *  holemon - the hole at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  UI components for display rendering
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

pub mod scrollers;
pub mod gauge;
pub mod chip;
pub mod weather;

// Re-exports
pub use scrollers::{draw_scrolling, scroll_offset};
pub use gauge::{draw_cycle_indicator, draw_hbar};
pub use chip::ChipGauge;
pub use weather::WeatherLines;
