/*
 *  display/drivers/mock.rs
 *
 *  holemon - the hole at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Mock display driver for testing and headless runs
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

use crate::config::DisplayConfig;
use crate::display::error::DisplayError;
use crate::display::traits::{DisplayCapabilities, DisplayDriver};

use std::sync::{Arc, Mutex, MutexGuard};

/// Panel stand-in for tests and for hosts without an OLED wired up.
///
/// Every frame handed to `write_buffer` is kept in a shared state so a test
/// can inspect it after the driver has been boxed and moved into a surface.
#[derive(Debug, Clone)]
pub struct MockDriver {
    /// Display capabilities
    capabilities: DisplayCapabilities,

    /// Shared state for testing
    state: Arc<Mutex<MockDriverState>>,
}

/// Internal state for the mock driver (shared for inspection in tests)
#[derive(Debug, Default)]
pub struct MockDriverState {
    /// Number of times init() was called
    pub init_count: usize,

    /// Number of times flush() was called
    pub flush_count: usize,

    /// Number of times clear() was called
    pub clear_count: usize,

    /// Number of frames received via write_buffer
    pub frame_count: usize,

    /// Last brightness value set
    pub last_brightness: Option<u8>,

    /// Last rotation set
    pub last_rotation: Option<u16>,

    /// Last invert state set
    pub last_invert: Option<bool>,

    /// Whether the driver is initialized
    pub is_initialized: bool,

    /// Total bytes written via write_buffer
    pub bytes_written: usize,

    /// Last packed frame as the glass shows it, LSB first; inverted
    /// while `last_invert` is `Some(true)`
    pub last_frame: Vec<u8>,

    /// Panel width, needed to address `last_frame`
    pub width: u32,

    /// Simulate failures (for error testing)
    pub simulate_flush_failure: bool,
    pub simulate_init_failure: bool,
}

impl MockDriverState {
    /// Pixel on the glass, None when out of bounds
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<bool> {
        if x >= self.width {
            return None;
        }
        let idx = (y * self.width + x) as usize;
        self.last_frame
            .get(idx / 8)
            .map(|byte| byte & (1 << (idx % 8)) != 0)
    }

    /// Number of lit pixels in the last frame
    pub fn count_on_pixels(&self) -> usize {
        self.last_frame.iter().map(|b| b.count_ones() as usize).sum()
    }

    fn inverted(&self) -> bool {
        self.last_invert == Some(true)
    }

    /// What the glass shows for a frame byte
    fn lit(&self, byte: u8) -> u8 {
        if self.inverted() { !byte } else { byte }
    }
}

impl MockDriver {
    /// Create a new mock driver, 128x32 unless the config says otherwise
    pub fn new(config: &DisplayConfig) -> Result<Self, DisplayError> {
        let width = config.width.unwrap_or(128);
        let height = config.height.unwrap_or(32);

        if width == 0 || height == 0 || (width * height) % 8 != 0 {
            return Err(DisplayError::UnsupportedGeometry { width, height });
        }

        let capabilities = DisplayCapabilities {
            width,
            height,
            supports_rotation: true,
            max_fps: 60,
            supports_brightness: true,
            supports_invert: true,
        };

        // the panel powers up dark, whatever the invert setting
        let state = MockDriverState {
            width,
            last_invert: config.invert,
            last_frame: vec![0; (width * height / 8) as usize],
            ..Default::default()
        };

        Ok(Self {
            capabilities,
            state: Arc::new(Mutex::new(state)),
        })
    }

    /// Create a mock driver with specific dimensions
    pub fn new_with_size(width: u32, height: u32) -> Result<Self, DisplayError> {
        let config = DisplayConfig {
            width: Some(width),
            height: Some(height),
            ..Default::default()
        };
        Self::new(&config)
    }

    /// Get reference to state for inspection in tests
    pub fn state(&self) -> Arc<Mutex<MockDriverState>> {
        Arc::clone(&self.state)
    }

    fn lock(&self) -> MutexGuard<'_, MockDriverState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Pixel of the last frame written
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<bool> {
        if y >= self.capabilities.height {
            return None;
        }
        self.lock().get_pixel(x, y)
    }

    /// Count number of pixels set in the last frame
    pub fn count_on_pixels(&self) -> usize {
        self.lock().count_on_pixels()
    }
}

impl DisplayDriver for MockDriver {
    fn capabilities(&self) -> &DisplayCapabilities {
        &self.capabilities
    }

    fn init(&mut self) -> Result<(), DisplayError> {
        let mut state = self.lock();

        if state.simulate_init_failure {
            return Err(DisplayError::PanelInit("simulated init failure".to_string()));
        }

        state.init_count += 1;
        state.is_initialized = true;
        Ok(())
    }

    fn set_brightness(&mut self, value: u8) -> Result<(), DisplayError> {
        self.lock().last_brightness = Some(value);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), DisplayError> {
        let mut state = self.lock();

        if state.simulate_flush_failure {
            // what a panel that dropped off the bus reports
            return Err(DisplayError::Interface(display_interface::DisplayError::BusWriteError));
        }

        state.flush_count += 1;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), DisplayError> {
        {
            let mut state = self.lock();
            state.clear_count += 1;
            let blank = state.lit(0);
            state.last_frame.iter_mut().for_each(|b| *b = blank);
        } // Release lock before calling flush

        self.flush()
    }

    fn write_buffer(&mut self, buffer: &[u8]) -> Result<(), DisplayError> {
        let expected_size = (self.capabilities.width * self.capabilities.height / 8) as usize;

        if buffer.len() != expected_size {
            return Err(DisplayError::FrameSize {
                expected: expected_size,
                actual: buffer.len(),
            });
        }

        {
            let mut state = self.lock();
            state.bytes_written += buffer.len();
            state.frame_count += 1;
            let glass: Vec<u8> = buffer.iter().map(|&b| state.lit(b)).collect();
            state.last_frame = glass;
        }

        self.flush()
    }

    fn set_invert(&mut self, inverted: bool) -> Result<(), DisplayError> {
        let mut state = self.lock();
        if state.inverted() != inverted {
            // the controller flips what is already on the glass
            state.last_frame.iter_mut().for_each(|b| *b = !*b);
        }
        state.last_invert = Some(inverted);
        Ok(())
    }

    fn set_rotation(&mut self, degrees: u16) -> Result<(), DisplayError> {
        if degrees != 0 && degrees != 90 && degrees != 180 && degrees != 270 {
            return Err(DisplayError::InvalidRotation(degrees));
        }
        self.lock().last_rotation = Some(degrees);
        Ok(())
    }
}
