/*
 *  stats/weather.rs
 *
 *  holemon - the hole at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Current conditions from wttr.in
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

use std::time::Duration;

use reqwest::{header, Client};
use serde::Deserialize;

use super::StatError;

const WTTR_URL: &str = "https://wttr.in";

/// Display-ready weather labels
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeatherSnapshot {
    pub reachable: bool,
    pub condition: String,
    pub temperature_label: String,
    pub humidity_label: String,
    pub wind_label: String,
    pub precipitation_label: String,
    pub probability_label: String,
}

impl WeatherSnapshot {
    /// The service could not be reached or answered nonsense
    pub fn unreachable() -> Self {
        Self::default()
    }
}

#[derive(Debug, Deserialize)]
struct WttrResponse {
    current_condition: Vec<CurrentCondition>,
    #[serde(default)]
    weather: Vec<WttrDay>,
}

#[derive(Debug, Deserialize)]
struct CurrentCondition {
    #[serde(rename = "temp_C")]
    temp_c: String,
    humidity: String,
    #[serde(rename = "weatherDesc", default)]
    weather_desc: Vec<WttrValue>,
    #[serde(rename = "winddir16Point", default)]
    wind_dir: String,
    #[serde(rename = "windspeedKmph", default)]
    wind_speed_kmph: String,
    #[serde(rename = "precipMM", default)]
    precip_mm: String,
}

#[derive(Debug, Deserialize)]
struct WttrValue {
    value: String,
}

#[derive(Debug, Deserialize)]
struct WttrDay {
    #[serde(default)]
    hourly: Vec<WttrHour>,
}

#[derive(Debug, Deserialize)]
struct WttrHour {
    #[serde(rename = "chanceofrain", default)]
    chance_of_rain: String,
}

fn or_zero(value: &str) -> &str {
    if value.trim().is_empty() { "0" } else { value.trim() }
}

impl WttrResponse {
    fn into_snapshot(self) -> Result<WeatherSnapshot, StatError> {
        let current = self
            .current_condition
            .into_iter()
            .next()
            .ok_or_else(|| StatError::Parse("no current_condition in weather report".to_string()))?;

        let condition = current
            .weather_desc
            .first()
            .map(|d| d.value.trim().to_string())
            .unwrap_or_default();

        let precipitation = current.precip_mm.trim().parse::<f32>().unwrap_or(0.0).round() as i32;

        let probability = self
            .weather
            .first()
            .and_then(|day| day.hourly.first())
            .map(|hour| hour.chance_of_rain.as_str())
            .unwrap_or("");

        Ok(WeatherSnapshot {
            reachable: true,
            condition,
            temperature_label: format!("{}°C", or_zero(&current.temp_c)),
            humidity_label: format!("{}%", or_zero(&current.humidity)),
            wind_label: format!("{} {}km/h", current.wind_dir.trim(), or_zero(&current.wind_speed_kmph))
                .trim_start()
                .to_string(),
            precipitation_label: format!("{}mm", precipitation),
            probability_label: format!("{}%", or_zero(probability)),
        })
    }
}

/// Parse a `format=j1` report
pub fn parse_report(body: &str) -> Result<WeatherSnapshot, StatError> {
    let report: WttrResponse =
        serde_json::from_str(body).map_err(|e| StatError::Parse(format!("weather report: {}", e)))?;
    report.into_snapshot()
}

/// HTTP client for the weather service, built once and reused
pub struct WeatherClient {
    client: Client,
    location: String,
}

impl WeatherClient {
    pub fn new(location: &str, timeout: Duration) -> Result<Self, StatError> {
        const VERSION: &str = concat!(env!("CARGO_PKG_NAME"), " v", env!("CARGO_PKG_VERSION"));
        let mut headers = header::HeaderMap::new();
        headers.insert("User-Agent", header::HeaderValue::from_static(VERSION));
        headers.insert("Accept", header::HeaderValue::from_static("application/json"));
        headers.insert("Connection", header::HeaderValue::from_static("close"));

        let client = Client::builder()
            .connect_timeout(timeout)
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            location: location.trim().replace(' ', "+"),
        })
    }

    pub fn url(&self) -> String {
        format!("{}/{}?format=j1", WTTR_URL, self.location)
    }

    pub async fn fetch(&self) -> Result<WeatherSnapshot, StatError> {
        let body = self
            .client
            .get(self.url())
            .send()
            .await?
            .error_for_status()? // none 2xx raise
            .text()
            .await?;
        parse_report(&body)
    }
}
