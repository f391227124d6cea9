/*
 *  tests/display_integration.rs
 *
 *  holemon - the hole at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Integration tests for the controller / engine pair
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

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use holemon::config;
use holemon::display::components::ChipGauge;
use holemon::display::{
    Controller, CycleView, DisplayEngine, DrawingSurface, EngineConfig, FontId, FrameSurface, LayoutConfig,
    MockDriver, Mode, ModePayload, Observer, ObserverError, Snapshot, SnapshotPublisher,
};
use holemon::stats::{StatError, StatSource, WeatherSnapshot};

#[derive(Default)]
struct CountingStats {
    refreshes: AtomicUsize,
    weather_reads: AtomicUsize,
    blocked_reads: AtomicUsize,
}

impl StatSource for CountingStats {
    fn refresh(&self) -> Result<(), StatError> {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
    fn cpu_load_percent(&self) -> Result<f32, StatError> { Ok(12.0) }
    fn memory_percent(&self) -> Result<f32, StatError> { Ok(48.0) }
    fn current_time_label(&self) -> Result<String, StatError> { Ok("07:30".to_string()) }
    fn blocked_query_count(&self) -> Result<u64, StatError> {
        self.blocked_reads.fetch_add(1, Ordering::SeqCst);
        Ok(2107)
    }
    fn total_query_count(&self) -> Result<u64, StatError> { Ok(17523) }
    fn blocked_percent(&self) -> Result<f32, StatError> { Ok(0.12) }
    fn top_client_label(&self) -> Result<String, StatError> { Ok("laptop".to_string()) }
    fn active_device_count(&self) -> Result<u32, StatError> { Ok(6) }
    fn known_device_count(&self) -> Result<u32, StatError> { Ok(14) }
    fn weather_snapshot(&self) -> Result<WeatherSnapshot, StatError> {
        self.weather_reads.fetch_add(1, Ordering::SeqCst);
        Ok(WeatherSnapshot {
            reachable: true,
            condition: "Light rain".to_string(),
            temperature_label: "12°C".to_string(),
            humidity_label: "81%".to_string(),
            wind_label: "SW 11km/h".to_string(),
            precipitation_label: "1mm".to_string(),
            probability_label: "64%".to_string(),
        })
    }
}

#[derive(Default)]
struct Counter {
    updates: AtomicUsize,
}

impl Observer for Counter {
    fn update(&self, _snapshot: &Snapshot) -> Result<(), ObserverError> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn rig_on<T: StatSource>(driver: MockDriver, stats: T) -> (DisplayEngine<FrameSurface, T>, Arc<Controller>, MockDriver) {
    let surface = FrameSurface::new(Box::new(driver.clone()));
    let (publisher, rx) = SnapshotPublisher::channel();
    let controller = Arc::new(Controller::new());
    controller.attach(Arc::new(publisher));
    (DisplayEngine::new(surface, stats, rx, EngineConfig::default()), controller, driver)
}

fn rig<T: StatSource>(stats: T) -> (DisplayEngine<FrameSurface, T>, Arc<Controller>, MockDriver) {
    rig_on(MockDriver::new_with_size(128, 32).unwrap(), stats)
}

fn glass(driver: &MockDriver) -> Vec<u8> {
    let state = driver.state();
    let frame = state.lock().unwrap().last_frame.clone();
    frame
}

/// The idle progress screen composed by hand: labels on rows 0 and 2,
/// the chip filled to `fill` with no activity ticks
fn progress_frame(name: &str, detail: &str, fill: f32) -> Vec<u8> {
    let driver = MockDriver::new_with_size(128, 32).unwrap();
    let mut surface = FrameSurface::new(Box::new(driver.clone()));
    let layout = LayoutConfig::new(128, 32);
    surface.draw_text(0, layout.row(0), name, FontId::Half).unwrap();
    surface.draw_text(0, layout.row(2), detail, FontId::Half).unwrap();
    ChipGauge::new(ChipGauge::DEFAULT_SEED).draw(&mut surface, &layout.chip, fill, false).unwrap();
    surface.present().unwrap();
    glass(&driver)
}

fn lit(frame: &[u8], x: i32, y: i32) -> bool {
    let idx = (y * 128 + x) as usize;
    frame[idx / 8] & (1 << (idx % 8)) != 0
}

#[test]
fn test_repeated_progress_reaches_the_engine_each_time() {
    let (mut engine, controller, _driver) = rig(CountingStats::default());
    let counter = Arc::new(Counter::default());
    controller.attach(counter.clone());

    let now = Instant::now();
    for percentage in [0.1f32, 0.4, 0.7] {
        assert!(controller.progress("UPDATING", "FIRMWARE", percentage, "UPDATE", "FINISHED"));
        engine.render_frame(now).unwrap();
        assert_eq!(engine.current().progress().unwrap().percentage, percentage);
    }
    assert_eq!(counter.updates.load(Ordering::SeqCst), 3);
}

#[test]
fn test_progress_out_of_range_is_clamped() {
    let (mut engine, controller, driver) = rig(CountingStats::default());
    let now = Instant::now();

    controller.progress("UPDATING", "FIRMWARE", 1.5, "UPDATE", "FINISHED");
    engine.render_frame(now).unwrap();
    let progress = engine.current().progress().unwrap();
    assert_eq!(progress.labels(), ("UPDATE", "FINISHED"));
    assert_eq!(progress.fill(), 1.0);
    // exactly the finished screen: completion labels, full chip, no ticks
    assert_eq!(glass(&driver), progress_frame("UPDATE", "FINISHED", 1.0));

    controller.progress("UPDATING", "FIRMWARE", -0.3, "UPDATE", "FINISHED");
    engine.render_frame(now).unwrap();
    let progress = engine.current().progress().unwrap();
    assert_eq!(progress.labels(), ("UPDATING", "FIRMWARE"));
    assert_eq!(progress.fill(), 0.0);

    let chip = LayoutConfig::new(128, 32).chip;
    let frame = glass(&driver);
    for y in chip.y0 + 1..chip.y1 {
        for x in chip.x0 + 1..chip.x1 {
            assert!(!lit(&frame, x, y), "chip body lit at ({}, {})", x, y);
        }
    }
    // left of the activity ticks the screen is the in-progress one
    let expected = progress_frame("UPDATING", "FIRMWARE", 0.0);
    let tick_zone = chip.x0 - chip.pin_length - 2 - chip.max_tick;
    for y in 0..32 {
        for x in 0..tick_zone {
            assert_eq!(lit(&frame, x, y), lit(&expected, x, y), "label pixel ({}, {})", x, y);
        }
    }
}

#[test]
fn test_invert_from_config_reaches_the_glass() {
    let cfg = config::parse_yaml("display:\n  driver: mock\n  invert: true\n").unwrap();
    let driver = MockDriver::new(&cfg.display()).unwrap();
    let (mut engine, controller, driver) = rig_on(driver, CountingStats::default());
    let now = Instant::now();

    controller.clear();
    engine.render_frame(now).unwrap();
    assert_eq!(driver.count_on_pixels(), 128 * 32);

    controller.progress("UPDATING", "FIRMWARE", 1.0, "UPDATE", "FINISHED");
    engine.render_frame(now).unwrap();
    let inverted: Vec<u8> = progress_frame("UPDATE", "FINISHED", 1.0).iter().map(|b| !b).collect();
    assert_eq!(glass(&driver), inverted);
}

#[test]
fn test_cycle_visits_every_view_once_per_dwell() {
    let (mut engine, controller, _driver) = rig(CountingStats::default());
    controller.cycle();

    let start = Instant::now();
    let mut visited = Vec::new();
    // 30 fps of simulated time for 40 s
    for frame in 0..=1200u64 {
        engine.render_frame(start + Duration::from_millis(frame * 1000 / 30)).unwrap();
        let view = engine.cycle().view().index();
        if visited.last() != Some(&view) {
            visited.push(view);
        }
    }
    assert_eq!(visited, vec![0, 1, 2, 3, 0]);
}

#[test]
fn test_swap_refreshes_happen_once_per_swap() {
    let stats = Arc::new(CountingStats::default());
    let (mut engine, controller, _driver) = rig(Arc::clone(&stats));
    controller.cycle();

    let start = Instant::now();
    for frame in 0..=1200u64 {
        engine.render_frame(start + Duration::from_millis(frame * 1000 / 30)).unwrap();
    }
    assert_eq!(stats.refreshes.load(Ordering::SeqCst), 2);
    assert_eq!(stats.weather_reads.load(Ordering::SeqCst), 1);
    assert_eq!(stats.blocked_reads.load(Ordering::SeqCst), 1);
    assert_eq!(engine.cycle().view(), CycleView::System);
    assert_eq!(engine.cycle().weather.line1, "Light rain 12°C RH:81%");
}

/// Every payload carries its sequence number twice, a torn update would
/// show two different numbers
fn check_consistent(snapshot: &Snapshot) {
    match snapshot.payload() {
        ModePayload::Progress(p) => {
            let seq: u32 = p.name.trim_start_matches('p').parse().unwrap();
            assert_eq!(p.detail, format!("d{}", seq));
            assert_eq!(p.percentage, seq as f32 / 1000.0);
        }
        ModePayload::Connection(c) => {
            assert_eq!(c.line(0), format!("c{}", c.attempt));
        }
        ModePayload::Message(m) => {
            assert_eq!(m.lines.len(), 2);
            assert_eq!(m.lines[0].trim_start_matches('m'), m.lines[1].trim_start_matches('n'));
        }
        ModePayload::Clear | ModePayload::Intro | ModePayload::Cycle | ModePayload::Warning => {}
    }
}

struct Checker {
    seen: AtomicUsize,
}

impl Observer for Checker {
    fn update(&self, snapshot: &Snapshot) -> Result<(), ObserverError> {
        check_consistent(snapshot);
        self.seen.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[test]
fn test_concurrent_mutation_never_tears_a_snapshot() {
    let (mut engine, controller, _driver) = rig(CountingStats::default());
    let checker = Arc::new(Checker { seen: AtomicUsize::new(0) });
    controller.attach(checker.clone());

    let done = Arc::new(AtomicBool::new(false));
    let frames = Arc::new(Mutex::new(0usize));

    let render = {
        let done = Arc::clone(&done);
        let frames = Arc::clone(&frames);
        thread::spawn(move || {
            let start = Instant::now();
            while !done.load(Ordering::SeqCst) {
                engine.render_frame(start).unwrap();
                check_consistent(engine.current());
                *frames.lock().unwrap() += 1;
            }
        })
    };

    let writers: Vec<_> = (0..4u32)
        .map(|writer| {
            let controller = Arc::clone(&controller);
            thread::spawn(move || {
                for i in 0..250u32 {
                    let seq = writer * 250 + i;
                    match seq % 4 {
                        0 => {
                            controller.progress(&format!("p{}", seq), &format!("d{}", seq), seq as f32 / 1000.0, "done", "ok");
                        }
                        1 => {
                            controller.connection(seq % 2 == 0, seq, vec![format!("c{}", seq), "WPS".to_string()]);
                        }
                        2 => {
                            controller.message(
                                holemon::display::Severity::Warning,
                                vec![format!("m{}", seq), format!("n{}", seq)],
                            );
                        }
                        _ => {
                            controller.cycle();
                        }
                    }
                }
            })
        })
        .collect();

    for writer in writers {
        writer.join().unwrap();
    }
    done.store(true, Ordering::SeqCst);
    render.join().unwrap();

    assert!(checker.seen.load(Ordering::SeqCst) >= 750);
    assert!(*frames.lock().unwrap() > 0);
}

#[test]
fn test_firmware_update_scenario() {
    let (mut engine, controller, driver) = rig(CountingStats::default());
    let mut now = Instant::now();

    controller.intro();
    engine.render_frame(now).unwrap();
    assert_eq!(engine.current().mode(), Mode::Intro);

    for step in 0..=10u32 {
        controller.progress("UPDATING", "FIRMWARE", step as f32 / 10.0, "UPDATE", "FINISHED");
        now += Duration::from_millis(33);
        engine.render_frame(now).unwrap();

        let progress = engine.current().progress().unwrap();
        if step < 10 {
            assert_eq!(progress.labels(), ("UPDATING", "FIRMWARE"));
        } else {
            assert_eq!(progress.labels(), ("UPDATE", "FINISHED"));
        }
    }
    assert_eq!(glass(&driver), progress_frame("UPDATE", "FINISHED", 1.0));

    controller.clear();
    engine.render_frame(now).unwrap();
    assert_eq!(driver.count_on_pixels(), 0);
}
