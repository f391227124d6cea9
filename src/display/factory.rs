/*
 *  display/factory.rs
 *
 *  holemon - the hole at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Factory for creating the configured display driver
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

use crate::config::{DisplayConfig, DriverKind};
use crate::display::drivers::mock::MockDriver;
use crate::display::error::DisplayFactoryError;
use crate::display::traits::DisplayDriver;
use log::info;

#[cfg(feature = "driver-ssd1306")]
use crate::config::BusConfig;

#[cfg(feature = "driver-ssd1306")]
use crate::display::drivers::ssd1306::Ssd1306Driver;

/// Type alias for boxed display driver trait objects
pub type BoxedDriver = Box<dyn DisplayDriver>;

/// Factory for creating display drivers from configuration
pub struct DisplayDriverFactory;

impl DisplayDriverFactory {
    /// Create a display driver from configuration
    ///
    /// Examines the driver kind and bus settings and builds the matching
    /// implementation.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let config = DisplayConfig {
    ///     driver: Some(DriverKind::Ssd1306),
    ///     bus: Some(BusConfig::I2c {
    ///         bus: "/dev/i2c-1".to_string(),
    ///         address: 0x3C,
    ///     }),
    ///     ..Default::default()
    /// };
    ///
    /// let driver = DisplayDriverFactory::create_from_config(&config)?;
    /// ```
    pub fn create_from_config(
        config: &DisplayConfig
    ) -> Result<BoxedDriver, DisplayFactoryError> {
        Self::validate_config(config)?;

        let driver_kind = config.driver.ok_or(DisplayFactoryError::NoDriverSpecified)?;

        match driver_kind {
            DriverKind::Mock => {
                info!("Using mock display driver, nothing will be shown");
                Ok(Box::new(MockDriver::new(config)?))
            }

            #[cfg(feature = "driver-ssd1306")]
            DriverKind::Ssd1306 => {
                let BusConfig::I2c { bus, address } = config.bus.as_ref()
                    .ok_or(DisplayFactoryError::NoBusConfiguration)?;
                Ok(Box::new(Ssd1306Driver::new_i2c(bus, *address, config)?))
            }

            #[cfg(not(feature = "driver-ssd1306"))]
            DriverKind::Ssd1306 => Err(DisplayFactoryError::DriverNotCompiled("driver-ssd1306")),
        }
    }

    /// Validate a configuration without creating a driver
    ///
    /// This is useful for checking configuration at startup before attempting
    /// to initialize hardware.
    pub fn validate_config(config: &DisplayConfig) -> Result<(), DisplayFactoryError> {
        let driver_kind = config.driver.ok_or(DisplayFactoryError::NoDriverSpecified)?;

        if driver_kind != DriverKind::Mock && config.bus.is_none() {
            return Err(DisplayFactoryError::NoBusConfiguration);
        }

        Ok(())
    }
}
