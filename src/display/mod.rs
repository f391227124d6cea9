/*
 *  display/mod.rs
 *
 *  holemon - the hole at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Display subsystem - mode controller, render engine and drivers
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

// Core trait definitions
pub mod traits;
pub mod error;
pub mod factory;
pub mod surface;

// Display drivers, hardware ones behind feature flags
pub mod drivers;

// Layout system for adaptive UI
pub mod layout;

// UI components
pub mod components;

// Mode state machine and the render loop observing it
pub mod mode;
pub mod controller;
pub mod cycle;
pub mod engine;

pub mod perf;

// Re-exports for convenience
pub use traits::{Bitmap, DisplayCapabilities, DisplayDriver, DrawingSurface, FontId};
pub use error::{DisplayError, DisplayFactoryError};
pub use factory::{BoxedDriver, DisplayDriverFactory};
pub use surface::FrameSurface;
pub use layout::{ChipLayout, LayoutConfig};
pub use mode::{ConnectionPayload, MessagePayload, Mode, ModePayload, ProgressPayload, Severity, Snapshot};
pub use controller::{Controller, Observer, ObserverError};
pub use cycle::{CycleState, CycleView};
pub use engine::{DisplayEngine, EngineConfig, EngineHandle, SnapshotPublisher};
pub use perf::PerformanceMetrics;

pub use drivers::mock::MockDriver;

#[cfg(feature = "driver-ssd1306")]
pub use drivers::ssd1306::Ssd1306Driver;
