/*
 *  display/drivers/ssd1306.rs
 *
 *  holemon - the hole at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  SSD1306 OLED display driver implementation
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

use linux_embedded_hal::I2cdev;
use ssd1306::{
    mode::{BufferedGraphicsMode, DisplayConfig as _},
    prelude::*,
    size::{DisplaySize128x32, DisplaySize128x64},
    I2CDisplayInterface,
    Ssd1306,
};

use crate::config::DisplayConfig;
use crate::display::error::DisplayError;
use crate::display::traits::{DisplayCapabilities, DisplayDriver};

use log::info;

type Panel<SIZE> = Ssd1306<I2CInterface<I2cdev>, SIZE, BufferedGraphicsMode<SIZE>>;

/// Enum to handle different SSD1306 display sizes
enum Ssd1306Variants {
    Size128x64(Panel<DisplaySize128x64>),
    Size128x32(Panel<DisplaySize128x32>),
}

/// SSD1306 display driver wrapper
pub struct Ssd1306Driver {
    /// The underlying ssd1306 driver
    display: Ssd1306Variants,

    /// Display capabilities
    capabilities: DisplayCapabilities,
}

// Dispatch a call to whichever panel size is wired up
macro_rules! with_panel {
    ($self:ident, $panel:ident => $body:expr) => {
        match &mut $self.display {
            Ssd1306Variants::Size128x64($panel) => $body,
            Ssd1306Variants::Size128x32($panel) => $body,
        }
    };
}

/// Copy a packed LSB first frame into the panel's own buffer
fn blit<SIZE: DisplaySize>(
    display: &mut Panel<SIZE>,
    buffer: &[u8],
    width: u32,
) {
    display.clear_buffer();
    for (byte_idx, &byte) in buffer.iter().enumerate() {
        if byte == 0 {
            continue;
        }
        for bit in 0..8 {
            if byte & (1 << bit) != 0 {
                let idx = (byte_idx * 8 + bit) as u32;
                display.set_pixel(idx % width, idx / width, true);
            }
        }
    }
}

fn brightness_level(value: u8) -> Brightness {
    match value {
        0..=63 => Brightness::DIMMEST,
        64..=127 => Brightness::DIM,
        128..=191 => Brightness::NORMAL,
        _ => Brightness::BRIGHTEST,
    }
}

impl Ssd1306Driver {
    /// Create a new SSD1306 driver using I2C
    ///
    /// # Arguments
    ///
    /// * `i2c_bus_path` - Path to I2C device (e.g., "/dev/i2c-1")
    /// * `address` - I2C address (typically 0x3C or 0x3D)
    /// * `config` - Display configuration
    pub fn new_i2c(
        i2c_bus_path: &str,
        address: u8,
        config: &DisplayConfig,
    ) -> Result<Self, DisplayError> {
        info!("Initializing SSD1306 on {} at address 0x{:02X}", i2c_bus_path, address);

        let i2c = I2cdev::new(i2c_bus_path)
            .map_err(|e| DisplayError::Bus(format!("{} not opened: {}", i2c_bus_path, e)))?;

        let width = config.width.unwrap_or(128);
        let height = config.height.unwrap_or(32);

        let interface = I2CDisplayInterface::new_custom_address(i2c, address);
        let display = match (width, height) {
            (128, 64) => Ssd1306Variants::Size128x64(
                Ssd1306::new(interface, DisplaySize128x64, DisplayRotation::Rotate0)
                    .into_buffered_graphics_mode(),
            ),
            (128, 32) => Ssd1306Variants::Size128x32(
                Ssd1306::new(interface, DisplaySize128x32, DisplayRotation::Rotate0)
                    .into_buffered_graphics_mode(),
            ),
            _ => {
                return Err(DisplayError::UnsupportedGeometry { width, height });
            }
        };

        let capabilities = DisplayCapabilities {
            width,
            height,
            supports_rotation: true,
            max_fps: 30, // I2C is slower
            supports_brightness: true,
            supports_invert: true,
        };

        let mut driver = Self { display, capabilities };

        driver.init()?;

        if let Some(brightness) = config.brightness {
            driver.set_brightness(brightness)?;
        }

        if let Some(rotation) = config.rotate_deg {
            driver.set_rotation(rotation)?;
        }

        if let Some(invert) = config.invert {
            driver.set_invert(invert)?;
        }

        info!("SSD1306 initialized successfully ({}x{})", width, height);

        Ok(driver)
    }
}

impl DisplayDriver for Ssd1306Driver {
    fn capabilities(&self) -> &DisplayCapabilities {
        &self.capabilities
    }

    fn init(&mut self) -> Result<(), DisplayError> {
        with_panel!(self, display => display.init()
            .map_err(|e| DisplayError::PanelInit(format!("{:?}", e))))
    }

    fn set_brightness(&mut self, value: u8) -> Result<(), DisplayError> {
        let level = brightness_level(value);
        with_panel!(self, display => display.set_brightness(level).map_err(DisplayError::from))
    }

    fn flush(&mut self) -> Result<(), DisplayError> {
        with_panel!(self, display => display.flush().map_err(DisplayError::from))
    }

    fn clear(&mut self) -> Result<(), DisplayError> {
        with_panel!(self, display => display.clear_buffer());
        self.flush()
    }

    fn write_buffer(&mut self, buffer: &[u8]) -> Result<(), DisplayError> {
        let width = self.capabilities.width;
        let expected_size = (width * self.capabilities.height / 8) as usize;

        if buffer.len() != expected_size {
            return Err(DisplayError::FrameSize {
                expected: expected_size,
                actual: buffer.len(),
            });
        }

        with_panel!(self, display => blit(display, buffer, width));
        self.flush()
    }

    fn set_invert(&mut self, inverted: bool) -> Result<(), DisplayError> {
        with_panel!(self, display => display.set_invert(inverted).map_err(DisplayError::from))
    }

    fn set_rotation(&mut self, degrees: u16) -> Result<(), DisplayError> {
        let rotation = match degrees {
            0 => DisplayRotation::Rotate0,
            90 => DisplayRotation::Rotate90,
            180 => DisplayRotation::Rotate180,
            270 => DisplayRotation::Rotate270,
            _ => return Err(DisplayError::InvalidRotation(degrees)),
        };

        with_panel!(self, display => display.set_rotation(rotation).map_err(DisplayError::from))
    }
}
