/*
 *  display/cycle.rs
 *
 *  holemon - the hole at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Carousel of stat views shown in cycle mode
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

use std::fmt;
use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::display::components::WeatherLines;
use crate::stats::{StatError, StatSource};

/// One page of the carousel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleView {
    System,
    WeatherTime,
    Blocked,
    Clients,
}

impl CycleView {
    pub const COUNT: usize = 4;

    pub fn from_index(index: usize) -> Self {
        match index % Self::COUNT {
            0 => CycleView::System,
            1 => CycleView::WeatherTime,
            2 => CycleView::Blocked,
            _ => CycleView::Clients,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for CycleView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CycleView::System => "system",
            CycleView::WeatherTime => "weather/time",
            CycleView::Blocked => "blocked",
            CycleView::Clients => "clients",
        };
        write!(f, "{}", name)
    }
}

/// Keep `slot` when the read failed, logging why
fn keep<T>(slot: &mut T, read: Result<T, StatError>, what: &str) {
    match read {
        Ok(value) => *slot = value,
        Err(e) => warn!("{} not refreshed, keeping previous: {}", what, e),
    }
}

/// Carousel position plus the values last read for each view.
///
/// Owned and mutated by the render loop only.
#[derive(Debug, Clone)]
pub struct CycleState {
    index: usize,
    last_swap: Instant,
    dwell: Duration,

    pub time_label: String,
    pub weather: WeatherLines,
    pub blocked: u64,
    pub total: u64,
    pub blocked_ratio: f32,
    pub cpu_percent: f32,
    pub memory_percent: f32,
    pub top_client: String,
    pub active_devices: u32,
    pub known_devices: u32,
}

impl CycleState {
    pub fn new(dwell: Duration, now: Instant) -> Self {
        Self {
            // entering advances onto the first view
            index: CycleView::COUNT - 1,
            last_swap: now,
            dwell,
            time_label: String::new(),
            weather: WeatherLines::default(),
            blocked: 0,
            total: 0,
            blocked_ratio: 0.0,
            cpu_percent: 0.0,
            memory_percent: 0.0,
            top_client: String::new(),
            active_devices: 0,
            known_devices: 0,
        }
    }

    pub fn view(&self) -> CycleView {
        CycleView::from_index(self.index)
    }

    pub fn dwell(&self) -> Duration {
        self.dwell
    }

    /// Called when cycle mode is (re)entered
    pub fn enter<T: StatSource + ?Sized>(&mut self, now: Instant, stats: &T) {
        self.swap(now, stats);
    }

    /// Advance when the dwell has run out; true when the view changed
    pub fn tick<T: StatSource + ?Sized>(&mut self, now: Instant, stats: &T) -> bool {
        if now.saturating_duration_since(self.last_swap) < self.dwell {
            return false;
        }
        self.swap(now, stats);
        true
    }

    /// Elapsed share of the current dwell, 0..=1
    pub fn progress(&self, now: Instant) -> f32 {
        if self.dwell.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.last_swap);
        (elapsed.as_secs_f32() / self.dwell.as_secs_f32()).clamp(0.0, 1.0)
    }

    fn swap<T: StatSource + ?Sized>(&mut self, now: Instant, stats: &T) {
        self.index = (self.index + 1) % CycleView::COUNT;
        self.last_swap = now;
        debug!("Cycle view -> {}", self.view());

        match self.view() {
            CycleView::System => {
                if let Err(e) = stats.refresh() {
                    warn!("Stat refresh not requested: {}", e);
                }
            }
            CycleView::WeatherTime => {
                keep(&mut self.time_label, stats.current_time_label(), "Time");
                match stats.weather_snapshot() {
                    Ok(weather) => self.weather = WeatherLines::from_snapshot(&weather),
                    Err(e) => warn!("Weather not refreshed, keeping previous: {}", e),
                }
            }
            CycleView::Blocked => {
                keep(&mut self.blocked, stats.blocked_query_count(), "Blocked count");
                keep(&mut self.total, stats.total_query_count(), "Total count");
                keep(&mut self.blocked_ratio, stats.blocked_percent(), "Blocked percentage");
            }
            CycleView::Clients => {}
        }
    }

    /// Per frame reads for the views that show live values
    pub fn read_frame<T: StatSource + ?Sized>(&mut self, stats: &T) {
        match self.view() {
            CycleView::System => {
                keep(&mut self.cpu_percent, stats.cpu_load_percent(), "CPU load");
                keep(&mut self.memory_percent, stats.memory_percent(), "Memory usage");
            }
            CycleView::Clients => {
                keep(&mut self.top_client, stats.top_client_label(), "Top client");
                keep(&mut self.active_devices, stats.active_device_count(), "Active devices");
                keep(&mut self.known_devices, stats.known_device_count(), "Known devices");
            }
            CycleView::WeatherTime | CycleView::Blocked => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::WeatherSnapshot;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counting {
        refreshes: AtomicUsize,
        weather_reads: AtomicUsize,
        blocked_reads: AtomicUsize,
        fail: bool,
    }

    impl Counting {
        fn check(&self) -> Result<(), StatError> {
            if self.fail { Err(StatError::Unavailable("test")) } else { Ok(()) }
        }
    }

    impl StatSource for Counting {
        fn refresh(&self) -> Result<(), StatError> {
            self.refreshes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
        fn cpu_load_percent(&self) -> Result<f32, StatError> {
            self.check().map(|_| 42.0)
        }
        fn memory_percent(&self) -> Result<f32, StatError> {
            self.check().map(|_| 61.0)
        }
        fn current_time_label(&self) -> Result<String, StatError> {
            self.check().map(|_| "12:34".to_string())
        }
        fn blocked_query_count(&self) -> Result<u64, StatError> {
            self.blocked_reads.fetch_add(1, Ordering::SeqCst);
            self.check().map(|_| 25)
        }
        fn total_query_count(&self) -> Result<u64, StatError> {
            self.check().map(|_| 100)
        }
        fn blocked_percent(&self) -> Result<f32, StatError> {
            self.check().map(|_| 0.25)
        }
        fn top_client_label(&self) -> Result<String, StatError> {
            self.check().map(|_| "laptop".to_string())
        }
        fn active_device_count(&self) -> Result<u32, StatError> {
            self.check().map(|_| 5)
        }
        fn known_device_count(&self) -> Result<u32, StatError> {
            self.check().map(|_| 9)
        }
        fn weather_snapshot(&self) -> Result<WeatherSnapshot, StatError> {
            self.weather_reads.fetch_add(1, Ordering::SeqCst);
            self.check().map(|_| WeatherSnapshot::unreachable())
        }
    }

    #[test]
    fn test_enter_starts_at_system() {
        let now = Instant::now();
        let stats = Counting::default();
        let mut cycle = CycleState::new(Duration::from_secs(10), now);
        cycle.enter(now, &stats);
        assert_eq!(cycle.view(), CycleView::System);
        assert_eq!(stats.refreshes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_views_rotate_on_dwell() {
        let start = Instant::now();
        let stats = Counting::default();
        let mut cycle = CycleState::new(Duration::from_secs(10), start);
        cycle.enter(start, &stats);

        let mut visited = vec![cycle.view().index()];
        // one frame every 100ms for 40s
        for frame in 1..=400u64 {
            let now = start + Duration::from_millis(frame * 100);
            if cycle.tick(now, &stats) {
                visited.push(cycle.view().index());
            }
        }
        assert_eq!(visited, vec![0, 1, 2, 3, 0]);
        assert_eq!(stats.refreshes.load(Ordering::SeqCst), 2);
        assert_eq!(stats.weather_reads.load(Ordering::SeqCst), 1);
        assert_eq!(stats.blocked_reads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_swap_reads_values() {
        let now = Instant::now();
        let stats = Counting::default();
        let mut cycle = CycleState::new(Duration::from_secs(10), now);
        cycle.enter(now, &stats);
        cycle.tick(now + Duration::from_secs(10), &stats);
        assert_eq!(cycle.time_label, "12:34");
        assert_eq!(cycle.weather, WeatherLines::unreachable());

        cycle.tick(now + Duration::from_secs(20), &stats);
        assert_eq!((cycle.blocked, cycle.total), (25, 100));
        assert_eq!(cycle.blocked_ratio, 0.25);
    }

    #[test]
    fn test_failed_reads_keep_previous() {
        let now = Instant::now();
        let good = Counting::default();
        let bad = Counting { fail: true, ..Default::default() };
        let mut cycle = CycleState::new(Duration::from_secs(10), now);
        cycle.enter(now, &good);
        cycle.read_frame(&good);
        assert_eq!(cycle.cpu_percent, 42.0);

        cycle.read_frame(&bad);
        assert_eq!(cycle.cpu_percent, 42.0);
        assert_eq!(cycle.memory_percent, 61.0);
    }

    #[test]
    fn test_progress_is_clamped() {
        let now = Instant::now();
        let cycle = CycleState::new(Duration::from_secs(10), now);
        assert_eq!(cycle.progress(now), 0.0);
        assert!((cycle.progress(now + Duration::from_secs(5)) - 0.5).abs() < 1e-3);
        assert_eq!(cycle.progress(now + Duration::from_secs(60)), 1.0);
    }
}
