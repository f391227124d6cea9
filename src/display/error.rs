/*
 *  display/error.rs
 *
 *  holemon - the hole at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Errors raised while driving the panel and the render thread
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

use std::error::Error;
use std::fmt;
use std::time::Duration;

/// Anything that stops a frame from reaching the glass.
///
/// Every variant is fatal to the render loop; the binary exits non-zero
/// and leaves restarting to the supervisor.
#[derive(Debug)]
pub enum DisplayError {
    /// Panel did not accept its init sequence
    PanelInit(String),

    /// I2C bus could not be opened
    Bus(String),

    /// Geometry the driver cannot drive
    UnsupportedGeometry { width: u32, height: u32 },

    Unsupported(&'static str),

    InvalidRotation(u16),

    /// Packed frame does not match the panel
    FrameSize { expected: usize, actual: usize },

    /// Composing into the frame buffer failed
    Draw(String),

    /// Transfer to the controller chip failed
    Interface(display_interface::DisplayError),

    /// Render thread did not stop within the join timeout
    RenderStalled(Duration),

    RenderThreadPanicked,

    Other(String),
}

impl fmt::Display for DisplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayError::PanelInit(msg) =>
                write!(f, "Panel init failed: {}", msg),
            DisplayError::Bus(msg) =>
                write!(f, "I2C bus error: {}", msg),
            DisplayError::UnsupportedGeometry { width, height } =>
                write!(f, "Unsupported panel geometry {}x{}", width, height),
            DisplayError::Unsupported(what) =>
                write!(f, "{} not supported by this panel", what),
            DisplayError::InvalidRotation(degrees) =>
                write!(f, "Invalid rotation {} (must be 0, 90, 180, or 270)", degrees),
            DisplayError::FrameSize { expected, actual } =>
                write!(f, "Frame is {} bytes, panel expects {}", actual, expected),
            DisplayError::Draw(msg) =>
                write!(f, "Drawing failed: {}", msg),
            DisplayError::Interface(err) =>
                write!(f, "Panel transfer failed: {:?}", err),
            DisplayError::RenderStalled(waited) =>
                write!(f, "Render thread still running after {:?}", waited),
            DisplayError::RenderThreadPanicked =>
                write!(f, "Render thread panicked"),
            DisplayError::Other(msg) =>
                write!(f, "{}", msg),
        }
    }
}

// display_interface::DisplayError is not std::error::Error, no source
impl Error for DisplayError {}

impl From<display_interface::DisplayError> for DisplayError {
    fn from(err: display_interface::DisplayError) -> Self {
        DisplayError::Interface(err)
    }
}

impl From<linux_embedded_hal::I2CError> for DisplayError {
    fn from(err: linux_embedded_hal::I2CError) -> Self {
        DisplayError::Bus(format!("{:?}", err))
    }
}

/// Why no driver could be built from the config
#[derive(Debug)]
pub enum DisplayFactoryError {
    NoDriverSpecified,

    NoBusConfiguration,

    /// Named driver needs a cargo feature this build lacks
    DriverNotCompiled(&'static str),

    DriverFailed(DisplayError),
}

impl fmt::Display for DisplayFactoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayFactoryError::NoDriverSpecified =>
                write!(f, "No display driver in the config"),
            DisplayFactoryError::NoBusConfiguration =>
                write!(f, "Display driver needs a bus section"),
            DisplayFactoryError::DriverNotCompiled(feature) =>
                write!(f, "Driver not available, rebuild with --features {}", feature),
            DisplayFactoryError::DriverFailed(err) =>
                write!(f, "Display driver failed to start: {}", err),
        }
    }
}

impl Error for DisplayFactoryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            DisplayFactoryError::DriverFailed(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DisplayError> for DisplayFactoryError {
    fn from(err: DisplayError) -> Self {
        DisplayFactoryError::DriverFailed(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_error_keeps_driver_cause() {
        let err = DisplayFactoryError::from(DisplayError::UnsupportedGeometry { width: 96, height: 16 });
        assert_eq!(err.to_string(), "Display driver failed to start: Unsupported panel geometry 96x16");
        assert!(err.source().is_some());
        assert!(DisplayFactoryError::NoBusConfiguration.source().is_none());
    }
}
