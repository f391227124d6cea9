/*
 *  display/components/weather.rs
 *
 *  holemon - the hole at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Weather lines and icon for the weather/time view
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

use crate::stats::WeatherSnapshot;
use crate::weather_glyph::WeatherIcon;

/// Two text lines and an icon, ready to draw
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherLines {
    pub line1: String,
    pub line2: String,
    pub icon: WeatherIcon,
}

impl Default for WeatherLines {
    fn default() -> Self {
        Self::unreachable()
    }
}

impl WeatherLines {
    pub fn unreachable() -> Self {
        Self {
            line1: "Weather service".to_string(),
            line2: "unreachable".to_string(),
            icon: WeatherIcon::Error,
        }
    }

    pub fn from_snapshot(weather: &WeatherSnapshot) -> Self {
        if !weather.reachable {
            return Self::unreachable();
        }
        Self {
            line1: format!("{} {} RH:{}", weather.condition, weather.temperature_label, weather.humidity_label),
            line2: format!("{} {}", weather.wind_label, weather.precipitation_label),
            icon: WeatherIcon::for_condition(&weather.condition),
        }
    }
}
