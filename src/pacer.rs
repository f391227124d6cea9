/*
 *  pacer.rs
 *
 *  holemon - the hole at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Render loop pacing and the frame tick
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

/// Fixed cadence pacer.
///
/// The render loop sleeps one frame period after each frame's work, drift
/// is accepted. The tick counts frames modulo the frame rate and drives
/// scrolling and animation.
#[derive(Debug, Clone)]
pub struct Pacer {
    frame: Duration,
    fps: u32,
    tick: u32,
}

// I²C we should manage 30fps
impl Pacer {
    pub fn new(target_fps: u32) -> Self {
        let fps = target_fps.max(1);
        let frame = Duration::from_micros((1_000_000u32 / fps) as u64);
        Self { frame, fps, tick: 0 }
    }

    #[inline]
    pub fn fps(&self) -> u32 { self.fps }

    #[inline]
    pub fn frame(&self) -> Duration { self.frame }

    #[inline]
    pub fn tick(&self) -> u32 { self.tick }

    /// Move to the next frame, wrapping at the frame rate
    #[inline]
    pub fn advance(&mut self) {
        self.tick = (self.tick + 1) % self.fps;
    }

    /// Sleep one frame period
    pub fn pause(&self) {
        std::thread::sleep(self.frame);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_wraps_at_fps() {
        let mut pacer = Pacer::new(30);
        assert_eq!(pacer.frame(), Duration::from_micros(33_333));
        for _ in 0..29 {
            pacer.advance();
        }
        assert_eq!(pacer.tick(), 29);
        pacer.advance();
        assert_eq!(pacer.tick(), 0);
    }

    #[test]
    fn test_zero_fps_is_floored() {
        let pacer = Pacer::new(0);
        assert_eq!(pacer.fps(), 1);
    }
}
