/*
 *  stats/mod.rs
 *
 *  holemon - the hole at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Everything the cycle views read: host load, appliance counters, weather
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

pub mod host;
pub mod metrics;
pub mod pihole;
pub mod weather;

use std::sync::Arc;
use thiserror::Error;

pub use host::{HostStatSource, PollerHandle, StatPoller, StatSettings};
pub use weather::WeatherSnapshot;

/// Why a stat could not be read
#[derive(Debug, Error)]
pub enum StatError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("command `{command}` failed: {reason}")]
    Command { command: String, reason: String },

    #[error("`{0}` timed out")]
    Timeout(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{0} not available yet")]
    Unavailable(&'static str),
}

/// Source of every value the cycle views draw.
///
/// Called from the render loop once per frame for some values, so an
/// implementation must answer from memory and never block on I/O.
pub trait StatSource: Send + Sync {
    /// Ask for the appliance counters to be re-acquired in the background
    fn refresh(&self) -> Result<(), StatError>;

    /// CPU load, 0..=100
    fn cpu_load_percent(&self) -> Result<f32, StatError>;

    /// Memory in use, 0..=100
    fn memory_percent(&self) -> Result<f32, StatError>;

    fn current_time_label(&self) -> Result<String, StatError>;

    fn blocked_query_count(&self) -> Result<u64, StatError>;

    fn total_query_count(&self) -> Result<u64, StatError>;

    /// Share of today's queries that were blocked, 0..=1
    fn blocked_percent(&self) -> Result<f32, StatError>;

    fn top_client_label(&self) -> Result<String, StatError>;

    fn active_device_count(&self) -> Result<u32, StatError>;

    fn known_device_count(&self) -> Result<u32, StatError>;

    fn weather_snapshot(&self) -> Result<WeatherSnapshot, StatError>;
}

impl<T: StatSource + ?Sized> StatSource for Arc<T> {
    fn refresh(&self) -> Result<(), StatError> {
        (**self).refresh()
    }

    fn cpu_load_percent(&self) -> Result<f32, StatError> {
        (**self).cpu_load_percent()
    }

    fn memory_percent(&self) -> Result<f32, StatError> {
        (**self).memory_percent()
    }

    fn current_time_label(&self) -> Result<String, StatError> {
        (**self).current_time_label()
    }

    fn blocked_query_count(&self) -> Result<u64, StatError> {
        (**self).blocked_query_count()
    }

    fn total_query_count(&self) -> Result<u64, StatError> {
        (**self).total_query_count()
    }

    fn blocked_percent(&self) -> Result<f32, StatError> {
        (**self).blocked_percent()
    }

    fn top_client_label(&self) -> Result<String, StatError> {
        (**self).top_client_label()
    }

    fn active_device_count(&self) -> Result<u32, StatError> {
        (**self).active_device_count()
    }

    fn known_device_count(&self) -> Result<u32, StatError> {
        (**self).known_device_count()
    }

    fn weather_snapshot(&self) -> Result<WeatherSnapshot, StatError> {
        (**self).weather_snapshot()
    }
}
