/*
 *  weather_glyph.rs
 *
 *  holemon - the hole at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Weather condition icons
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

use crate::display::traits::Bitmap;

/// Weather glyph dimensions
pub const WEATHER_GLYPH_WIDTH: u32 = 16;
pub const WEATHER_GLYPH_HEIGHT: u32 = 16;

/// 'weather', 10 glyphs of 16x16 in `WeatherIcon` order
const WEATHER_RAW_DATA: &[u8] = include_bytes!("../data/weather_16x16.bin");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeatherIcon {
    Sun = 0,
    Error = 1,
    Rain = 2,
    Cloud = 3,
    Clear = 4,
    Snow = 5,
    Fog = 6,
    Wind = 7,
    Thunder = 8,
    Clock = 9,
}

// First keyword hit wins, so "sunny intervals with rain" is Sun
const KEYWORDS: &[(&[&str], WeatherIcon)] = &[
    (&["sun"], WeatherIcon::Sun),
    (&["error"], WeatherIcon::Error),
    (&["rain"], WeatherIcon::Rain),
    (&["cloud", "overcast"], WeatherIcon::Cloud),
    (&["clear"], WeatherIcon::Clear),
    (&["snow"], WeatherIcon::Snow),
    (&["fog"], WeatherIcon::Fog),
    (&["wind"], WeatherIcon::Wind),
    (&["thunder", "storm"], WeatherIcon::Thunder),
];

impl WeatherIcon {
    /// Icon for a free text condition, case insensitive, clock when nothing matches
    pub fn for_condition(condition: &str) -> Self {
        let condition = condition.to_lowercase();
        KEYWORDS
            .iter()
            .find(|(words, _)| words.iter().any(|w| condition.contains(w)))
            .map(|(_, icon)| *icon)
            .unwrap_or(WeatherIcon::Clock)
    }

    pub fn bitmap(self) -> Option<Bitmap> {
        crate::glyphs::get_glyph_slice(
            WEATHER_RAW_DATA,
            self as usize,
            WEATHER_GLYPH_WIDTH,
            WEATHER_GLYPH_HEIGHT,
        )
        .map(|data| Bitmap { data, width: WEATHER_GLYPH_WIDTH, height: WEATHER_GLYPH_HEIGHT })
    }
}
