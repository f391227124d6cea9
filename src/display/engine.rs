/*
 *  display/engine.rs
 *
 *  holemon - the hole at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Render loop: turns the latest snapshot into frames at a fixed rate
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

use std::fmt::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use arrayvec::ArrayString;
use log::{debug, error, info, warn};
use tokio::sync::watch;

use crate::config::Config;
use crate::display::components::{draw_cycle_indicator, draw_hbar, draw_scrolling, ChipGauge};
use crate::display::controller::{Observer, ObserverError};
use crate::display::cycle::{CycleState, CycleView};
use crate::display::error::DisplayError;
use crate::display::layout::LayoutConfig;
use crate::display::mode::{ConnectionPayload, MessagePayload, Mode, ProgressPayload, Snapshot};
use crate::display::perf::PerformanceMetrics;
use crate::display::traits::{DrawingSurface, FontId};
use crate::glyphs::{self, INTRO_HEIGHT, INTRO_WIDTH};
use crate::pacer::Pacer;
use crate::stats::StatSource;

/// Hint shown under the pairing status
pub const WPS_HINT: &str = "Press WPS on router";

/// Observer side of the engine: every snapshot replaces the previous one
/// in a watch channel the render loop reads once per frame.
pub struct SnapshotPublisher {
    tx: watch::Sender<Arc<Snapshot>>,
}

impl SnapshotPublisher {
    pub fn channel() -> (Self, watch::Receiver<Arc<Snapshot>>) {
        let (tx, rx) = watch::channel(Arc::new(Snapshot::default()));
        (Self { tx }, rx)
    }
}

impl Observer for SnapshotPublisher {
    fn update(&self, snapshot: &Snapshot) -> Result<(), ObserverError> {
        self.tx.send_replace(Arc::new(snapshot.clone()));
        if self.tx.is_closed() {
            return Err(ObserverError::Disconnected);
        }
        Ok(())
    }
}

/// Render loop settings
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    pub fps: u32,
    pub dwell: Duration,
    pub seed: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fps: crate::config::DEFAULT_FPS,
            dwell: Duration::from_secs(crate::config::DEFAULT_DWELL_SECS),
            seed: ChipGauge::DEFAULT_SEED,
        }
    }
}

impl EngineConfig {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            fps: cfg.fps(),
            dwell: cfg.dwell(),
            ..Default::default()
        }
    }
}

/// Scratch space for labels formatted every frame
struct RenderBuffers {
    label: ArrayString<48>,
}

/// Draws whatever the latest snapshot asks for, one frame at a time.
///
/// Owns the surface, the fonts (through [`FontId`]) and the cycle
/// sub-state; nothing here is shared with other threads except the
/// snapshot receiver.
pub struct DisplayEngine<S: DrawingSurface, T: StatSource> {
    surface: S,
    stats: T,
    snapshots: watch::Receiver<Arc<Snapshot>>,
    current: Arc<Snapshot>,
    last_mode: Mode,
    layout: LayoutConfig,
    pacer: Pacer,
    cycle: CycleState,
    chip: ChipGauge,
    intro_frame: usize,
    perf: PerformanceMetrics,
    buffers: RenderBuffers,
}

impl<S: DrawingSurface, T: StatSource> DisplayEngine<S, T> {
    pub fn new(surface: S, stats: T, snapshots: watch::Receiver<Arc<Snapshot>>, config: EngineConfig) -> Self {
        let (width, height) = surface.size();
        let current = snapshots.borrow().clone();
        let pacer = Pacer::new(config.fps);
        Self {
            surface,
            stats,
            snapshots,
            last_mode: Mode::Clear,
            current,
            layout: LayoutConfig::new(width, height),
            perf: PerformanceMetrics::new(pacer.fps()),
            pacer,
            cycle: CycleState::new(config.dwell, Instant::now()),
            chip: ChipGauge::new(config.seed),
            intro_frame: 0,
            buffers: RenderBuffers { label: ArrayString::new() },
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Snapshot used for the last frame
    pub fn current(&self) -> &Snapshot {
        &self.current
    }

    pub fn cycle(&self) -> &CycleState {
        &self.cycle
    }

    pub fn tick(&self) -> u32 {
        self.pacer.tick()
    }

    pub fn perf(&self) -> &PerformanceMetrics {
        &self.perf
    }

    /// Compose and present one frame as of `now`, then advance the tick
    pub fn render_frame(&mut self, now: Instant) -> Result<(), DisplayError> {
        self.current = self.snapshots.borrow_and_update().clone();
        let mode = self.current.mode();
        if mode != self.last_mode {
            debug!("Render loop picked up {} mode", mode);
            match mode {
                Mode::Cycle => self.cycle.enter(now, &self.stats),
                Mode::Intro => self.intro_frame = 0,
                _ => {}
            }
            self.last_mode = mode;
        } else if mode == Mode::Cycle {
            self.cycle.tick(now, &self.stats);
        }

        let started = Instant::now();
        self.surface.clear()?;
        let snapshot = Arc::clone(&self.current);
        match mode {
            Mode::Clear | Mode::Warning => {}
            Mode::Intro => self.draw_intro()?,
            Mode::Cycle => self.draw_cycle(now)?,
            Mode::Progress => {
                if let Some(progress) = snapshot.progress() {
                    self.draw_progress(progress)?;
                }
            }
            Mode::Message => {
                if let Some(message) = snapshot.message() {
                    self.draw_message(message)?;
                }
            }
            Mode::Connection => {
                if let Some(connection) = snapshot.connection() {
                    self.draw_connection(connection)?;
                }
            }
        }
        let render_us = started.elapsed().as_micros() as u64;

        let transfer = Instant::now();
        self.surface.present()?;
        self.perf.record_frame(render_us, transfer.elapsed().as_micros() as u64);

        self.pacer.advance();
        Ok(())
    }

    /// Render until `stop` is raised, then blank the panel
    pub fn run(&mut self, stop: &AtomicBool) -> Result<(), DisplayError> {
        info!("Render loop starting at {} fps", self.pacer.fps());
        while !stop.load(Ordering::Relaxed) {
            self.render_frame(Instant::now())?;
            self.pacer.pause();
        }
        self.surface.clear()?;
        self.surface.present()?;
        info!("Render loop stopped after {} frames ({} over budget)", self.perf.frame_count, self.perf.overruns);
        Ok(())
    }

    fn draw_intro(&mut self) -> Result<(), DisplayError> {
        if let Some(frame) = glyphs::intro_frame(self.intro_frame) {
            let x = (self.layout.width - INTRO_WIDTH as i32) / 2;
            let y = (self.layout.height - INTRO_HEIGHT as i32) / 2;
            self.surface.draw_bitmap(x, y, &frame)?;
        }
        self.intro_frame = self.intro_frame.wrapping_add(1);
        Ok(())
    }

    fn draw_progress(&mut self, progress: &ProgressPayload) -> Result<(), DisplayError> {
        let (name, detail) = progress.labels();
        self.surface.draw_text(0, self.layout.row(0), name, FontId::Half)?;
        self.surface.draw_text(0, self.layout.row(2), detail, FontId::Half)?;
        self.chip.draw(&mut self.surface, &self.layout.chip, progress.fill(), !progress.is_finished())
    }

    fn draw_connection(&mut self, connection: &ConnectionPayload) -> Result<(), DisplayError> {
        let (tick, fps) = (self.pacer.tick(), self.pacer.fps());
        self.buffers.label.clear();
        let _ = write!(&mut self.buffers.label, "Attempt: {}", connection.attempt);

        let lines = [connection.line(0), connection.line(1), WPS_HINT, self.buffers.label.as_str()];
        for (row, line) in lines.iter().enumerate() {
            draw_scrolling(&mut self.surface, 0, self.layout.row(row as i32), line, FontId::Small, tick, fps)?;
        }
        Ok(())
    }

    fn draw_message(&mut self, message: &MessagePayload) -> Result<(), DisplayError> {
        let (tick, fps) = (self.pacer.tick(), self.pacer.fps());
        // badge: one small glyph in an outlined box
        self.surface.draw_rect(0, 0, 8, 9, false)?;
        self.surface.draw_text(2, 1, message.severity.badge(), FontId::Small)?;

        let rows = self.layout.height / FontId::Small.line_height();
        for (row, line) in message.lines.iter().take(rows.max(0) as usize).enumerate() {
            draw_scrolling(&mut self.surface, 12, self.layout.row(row as i32), line, FontId::Small, tick, fps)?;
        }
        Ok(())
    }

    fn draw_cycle(&mut self, now: Instant) -> Result<(), DisplayError> {
        self.cycle.read_frame(&self.stats);
        match self.cycle.view() {
            CycleView::System => self.draw_system()?,
            CycleView::WeatherTime => self.draw_weather_time()?,
            CycleView::Blocked => self.draw_blocked()?,
            CycleView::Clients => self.draw_clients()?,
        }
        draw_cycle_indicator(&mut self.surface, &self.layout, self.cycle.progress(now))
    }

    fn draw_system(&mut self) -> Result<(), DisplayError> {
        let half = self.layout.width / 2;
        let bar_w = half - self.layout.indicator_width - 2;
        self.surface.draw_text(0, self.layout.row(0), "CPU: ", FontId::Half)?;
        draw_hbar(&mut self.surface, half, 1, bar_w, 14, self.cycle.cpu_percent / 100.0)?;
        self.surface.draw_text(0, self.layout.row(2), "RAM: ", FontId::Half)?;
        draw_hbar(&mut self.surface, half, 17, bar_w, 14, self.cycle.memory_percent / 100.0)
    }

    fn draw_weather_time(&mut self) -> Result<(), DisplayError> {
        let (tick, fps) = (self.pacer.tick(), self.pacer.fps());
        if let Some(icon) = self.cycle.weather.icon.bitmap() {
            self.surface.draw_bitmap(0, 0, &icon)?;
        }
        self.surface.draw_text(self.layout.clock_x, self.layout.row(0), &self.cycle.time_label, FontId::Half)?;
        draw_scrolling(&mut self.surface, 0, self.layout.row(2), &self.cycle.weather.line1, FontId::Small, tick, fps)?;
        draw_scrolling(&mut self.surface, 0, self.layout.row(3), &self.cycle.weather.line2, FontId::Small, tick, fps)
    }

    fn draw_blocked(&mut self) -> Result<(), DisplayError> {
        let (tick, fps) = (self.pacer.tick(), self.pacer.fps());
        draw_scrolling(&mut self.surface, 0, self.layout.row(0), "Blocked today:", FontId::Small, tick, fps)?;
        draw_hbar(&mut self.surface, 0, self.layout.row(1), self.layout.content_width(), 14, self.cycle.blocked_ratio)?;

        self.buffers.label.clear();
        let _ = write!(&mut self.buffers.label, "({}/{})", self.cycle.blocked, self.cycle.total);
        draw_scrolling(&mut self.surface, 0, self.layout.row(3), &self.buffers.label, FontId::Small, tick, fps)
    }

    fn draw_clients(&mut self) -> Result<(), DisplayError> {
        let (tick, fps) = (self.pacer.tick(), self.pacer.fps());
        self.surface.draw_text(0, self.layout.row(0), "Top Client:", FontId::Small)?;
        draw_scrolling(&mut self.surface, 0, self.layout.row(1), &self.cycle.top_client, FontId::Half, tick, fps)?;
        self.surface.draw_text(0, self.layout.row(3), "Clients:", FontId::Small)?;

        self.buffers.label.clear();
        let _ = write!(&mut self.buffers.label, "{}/{}", self.cycle.active_devices, self.cycle.known_devices);
        let width = self.surface.measure_text_width(&self.buffers.label, FontId::Small) as i32;
        let x = self.layout.content_width() - width;
        self.surface.draw_text(x, self.layout.row(3), &self.buffers.label, FontId::Small)
    }
}

impl<S, T> DisplayEngine<S, T>
where
    S: DrawingSurface + 'static,
    T: StatSource + 'static,
{
    /// Move the engine onto its own render thread
    pub fn spawn(self) -> Result<EngineHandle, DisplayError> {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);
        let handle = thread::Builder::new()
            .name("holemon-render".to_string())
            .spawn(move || {
                let mut engine = self;
                let result = engine.run(&flag);
                if let Err(e) = &result {
                    error!("Render loop failed: {}", e);
                }
                result
            })
            .map_err(|e| DisplayError::Other(format!("Render thread not started: {}", e)))?;
        Ok(EngineHandle { stop, handle: Some(handle) })
    }
}

/// Owner's side of a running render thread
pub struct EngineHandle {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<Result<(), DisplayError>>>,
}

impl EngineHandle {
    /// The render thread has exited, on request or on error
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map(|h| h.is_finished()).unwrap_or(true)
    }

    /// Raise the stop flag and wait up to `join_timeout` for the thread.
    ///
    /// Returns the loop's own error when it failed, and gives up (leaving
    /// the thread detached) when it does not stop in time.
    pub fn shutdown(mut self, join_timeout: Duration) -> Result<(), DisplayError> {
        self.stop.store(true, Ordering::Relaxed);
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };

        let deadline = Instant::now() + join_timeout;
        while !handle.is_finished() {
            if Instant::now() >= deadline {
                warn!("Render thread did not stop within {:?}", join_timeout);
                return Err(DisplayError::RenderStalled(join_timeout));
            }
            thread::sleep(Duration::from_millis(5));
        }
        handle.join().map_err(|_| DisplayError::RenderThreadPanicked)?
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::controller::Controller;
    use crate::display::drivers::mock::MockDriver;
    use crate::display::mode::Severity;
    use crate::display::surface::FrameSurface;
    use crate::stats::{HostStatSource, StatError, WeatherSnapshot};

    struct Fixed;

    impl StatSource for Fixed {
        fn refresh(&self) -> Result<(), StatError> { Ok(()) }
        fn cpu_load_percent(&self) -> Result<f32, StatError> { Ok(50.0) }
        fn memory_percent(&self) -> Result<f32, StatError> { Ok(25.0) }
        fn current_time_label(&self) -> Result<String, StatError> { Ok("09:41".to_string()) }
        fn blocked_query_count(&self) -> Result<u64, StatError> { Ok(10) }
        fn total_query_count(&self) -> Result<u64, StatError> { Ok(40) }
        fn blocked_percent(&self) -> Result<f32, StatError> { Ok(0.25) }
        fn top_client_label(&self) -> Result<String, StatError> { Ok("a-very-long-client-name.example".to_string()) }
        fn active_device_count(&self) -> Result<u32, StatError> { Ok(3) }
        fn known_device_count(&self) -> Result<u32, StatError> { Ok(7) }
        fn weather_snapshot(&self) -> Result<WeatherSnapshot, StatError> { Ok(WeatherSnapshot::unreachable()) }
    }

    fn engine<T: StatSource>(stats: T) -> (DisplayEngine<FrameSurface, T>, Controller, MockDriver) {
        let driver = MockDriver::new_with_size(128, 32).unwrap();
        let surface = FrameSurface::new(Box::new(driver.clone()));
        let (publisher, rx) = SnapshotPublisher::channel();
        let controller = Controller::new();
        controller.attach(Arc::new(publisher));
        (DisplayEngine::new(surface, stats, rx, EngineConfig::default()), controller, driver)
    }

    #[test]
    fn test_clear_mode_presents_blank_frames() {
        let (mut engine, _controller, driver) = engine(Fixed);
        engine.render_frame(Instant::now()).unwrap();
        assert_eq!(driver.state().lock().unwrap().frame_count, 1);
        assert_eq!(driver.count_on_pixels(), 0);
        assert_eq!(engine.tick(), 1);
    }

    #[test]
    fn test_latest_snapshot_wins() {
        let (mut engine, controller, _driver) = engine(Fixed);
        controller.intro();
        controller.message(Severity::Info, vec!["hello".into()]);
        engine.render_frame(Instant::now()).unwrap();
        assert_eq!(engine.current().mode(), Mode::Message);
    }

    #[test]
    fn test_intro_draws_centered_animation() {
        let (mut engine, controller, driver) = engine(Fixed);
        controller.intro();
        engine.render_frame(Instant::now()).unwrap();
        assert!(driver.count_on_pixels() > 0);
        // nothing outside the centered 32x32 box
        for x in [0u32, 47, 80, 127] {
            for y in 0..32 {
                assert_eq!(driver.get_pixel(x, y), Some(false));
            }
        }
    }

    #[test]
    fn test_cycle_entry_starts_at_system_view() {
        let (mut engine, controller, driver) = engine(Fixed);
        controller.cycle();
        let now = Instant::now();
        engine.render_frame(now).unwrap();
        assert_eq!(engine.cycle().view(), CycleView::System);
        assert_eq!(engine.cycle().cpu_percent, 50.0);
        assert!(driver.count_on_pixels() > 0);

        engine.render_frame(now + Duration::from_secs(10)).unwrap();
        assert_eq!(engine.cycle().view(), CycleView::WeatherTime);
        assert_eq!(engine.cycle().time_label, "09:41");
    }

    #[test]
    fn test_cycle_reentry_advances() {
        let (mut engine, controller, _driver) = engine(Fixed);
        let now = Instant::now();
        controller.cycle();
        engine.render_frame(now).unwrap();
        controller.clear();
        engine.render_frame(now).unwrap();
        controller.cycle();
        engine.render_frame(now).unwrap();
        assert_eq!(engine.cycle().view(), CycleView::WeatherTime);
    }

    #[test]
    fn test_all_cycle_views_render_with_empty_source() {
        // nothing polled yet, every read fails and defaults are drawn
        let (mut engine, controller, _driver) = engine(HostStatSource::new());
        controller.cycle();
        let start = Instant::now();
        for view in 0..4u64 {
            engine.render_frame(start + Duration::from_secs(view * 10)).unwrap();
        }
        assert_eq!(engine.cycle().view(), CycleView::Clients);
    }

    #[test]
    fn test_connection_and_warning() {
        let (mut engine, controller, driver) = engine(Fixed);
        controller.connection(false, 2, vec!["No connection".into(), "Starting WPS".into()]);
        engine.render_frame(Instant::now()).unwrap();
        assert!(driver.count_on_pixels() > 0);

        controller.warning();
        engine.render_frame(Instant::now()).unwrap();
        assert_eq!(driver.count_on_pixels(), 0);
    }

    #[test]
    fn test_drawing_failure_propagates() {
        let (mut engine, _controller, driver) = engine(Fixed);
        driver.state().lock().unwrap().simulate_flush_failure = true;
        assert!(engine.render_frame(Instant::now()).is_err());
    }

    #[test]
    fn test_spawn_and_shutdown_blanks_panel() {
        let (engine, controller, driver) = engine(Fixed);
        controller.intro();
        let handle = engine.spawn().unwrap();
        thread::sleep(Duration::from_millis(100));
        assert!(!handle.is_finished());
        handle.shutdown(Duration::from_secs(2)).unwrap();
        assert!(driver.state().lock().unwrap().frame_count > 1);
        assert_eq!(driver.count_on_pixels(), 0);
    }

    #[test]
    fn test_render_thread_error_surfaces_on_shutdown() {
        let (engine, _controller, driver) = engine(Fixed);
        driver.state().lock().unwrap().simulate_flush_failure = true;
        let handle = engine.spawn().unwrap();
        let deadline = Instant::now() + Duration::from_secs(2);
        while !handle.is_finished() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert!(handle.is_finished());
        assert!(handle.shutdown(Duration::from_secs(1)).is_err());
    }
}
