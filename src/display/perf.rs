/*
 *  display/perf.rs
 *
 *  holemon - the hole at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Frame timing
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

use log::warn;

/// Performance metrics for the render loop
#[derive(Debug, Clone, Default)]
pub struct PerformanceMetrics {
    /// Total frame time (render + transfer)
    pub frame_time_us: u64,

    /// Time spent composing the frame
    pub render_time_us: u64,

    /// Time spent transferring to hardware
    pub transfer_time_us: u64,

    /// Frame counter for averaging
    pub frame_count: u64,

    /// Average frame time, halved toward each new sample
    pub avg_frame_time_us: u64,

    /// Frames that blew the budget
    pub overruns: u64,

    /// Target frame time based on frame rate
    pub target_frame_time_us: u64,
}

impl PerformanceMetrics {
    pub fn new(target_fps: u32) -> Self {
        Self {
            target_frame_time_us: 1_000_000 / target_fps.max(1) as u64,
            ..Default::default()
        }
    }

    /// Record one frame, returns true when it ran over budget
    pub fn record_frame(&mut self, render_time_us: u64, transfer_time_us: u64) -> bool {
        self.render_time_us = render_time_us;
        self.transfer_time_us = transfer_time_us;
        self.frame_time_us = render_time_us + transfer_time_us;
        self.frame_count += 1;

        if self.avg_frame_time_us == 0 {
            self.avg_frame_time_us = self.frame_time_us;
        } else {
            self.avg_frame_time_us = (self.avg_frame_time_us + self.frame_time_us) / 2;
        }

        // Warn if exceeding target by >20%
        let over = self.frame_time_us > self.target_frame_time_us * 12 / 10;
        if over {
            self.overruns += 1;
            warn!("Frame time {}μs exceeds target {}μs (render: {}μs, transfer: {}μs)",
                  self.frame_time_us, self.target_frame_time_us,
                  render_time_us, transfer_time_us);
        }
        over
    }

    pub fn fps(&self) -> f32 {
        if self.avg_frame_time_us == 0 {
            0.0
        } else {
            1_000_000.0 / self.avg_frame_time_us as f32
        }
    }
}
