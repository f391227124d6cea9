/*
 *  stats/host.rs
 *
 *  holemon - the hole at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Cached stat source for this host plus the task that keeps it fresh
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

use std::path::PathBuf;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use chrono::Local;
use log::{debug, error, info, warn};
use tokio::process::Command;
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;
use tokio::time::{interval, timeout, MissedTickBehavior};

use super::metrics::MachineMetrics;
use super::pihole::{self, KnownClients, PiholeStats};
use super::weather::{WeatherClient, WeatherSnapshot};
use super::{StatError, StatSource};
use crate::config::Config;

/// Poll intervals and limits for [`StatPoller`]
#[derive(Debug, Clone)]
pub struct StatSettings {
    pub weather_location: String,
    pub weather_refresh: Duration,
    pub http_timeout: Duration,
    pub known_clients_path: PathBuf,
    pub appliance_poll: Duration,
    pub command_timeout: Duration,
    pub system_poll: Duration,
}

impl StatSettings {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            weather_location: cfg.weather_location(),
            weather_refresh: cfg.weather_refresh(),
            http_timeout: cfg.http_timeout(),
            known_clients_path: cfg.known_clients_path(),
            appliance_poll: cfg.stats_poll(),
            command_timeout: cfg.command_timeout(),
            system_poll: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Default)]
struct StatCache {
    cpu: Option<f32>,
    memory: Option<f32>,
    pihole: Option<PiholeStats>,
    neighbours: Option<u32>,
    weather: Option<WeatherSnapshot>,
}

/// [`StatSource`] answering from memory; a [`StatPoller`] fills it in.
#[derive(Debug, Default)]
pub struct HostStatSource {
    cache: RwLock<StatCache>,
    nudge: Notify,
}

impl HostStatSource {
    pub fn new() -> Self {
        Self::default()
    }

    // plain data behind the lock, a poisoned one is still consistent
    fn read(&self) -> RwLockReadGuard<'_, StatCache> {
        self.cache.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, StatCache> {
        self.cache.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn with_pihole<R>(&self, f: impl FnOnce(&PiholeStats) -> R) -> Result<R, StatError> {
        self.read().pihole.as_ref().map(f).ok_or(StatError::Unavailable("appliance stats"))
    }

    pub fn store_system(&self, cpu: Option<f32>, memory: Option<f32>) {
        let mut cache = self.write();
        if cpu.is_some() {
            cache.cpu = cpu;
        }
        if memory.is_some() {
            cache.memory = memory;
        }
    }

    pub fn store_pihole(&self, stats: PiholeStats) {
        self.write().pihole = Some(stats);
    }

    pub fn store_neighbours(&self, count: u32) {
        self.write().neighbours = Some(count);
    }

    pub fn store_weather(&self, weather: WeatherSnapshot) {
        self.write().weather = Some(weather);
    }
}

impl StatSource for HostStatSource {
    fn refresh(&self) -> Result<(), StatError> {
        self.nudge.notify_one();
        Ok(())
    }

    fn cpu_load_percent(&self) -> Result<f32, StatError> {
        self.read().cpu.ok_or(StatError::Unavailable("cpu load"))
    }

    fn memory_percent(&self) -> Result<f32, StatError> {
        self.read().memory.ok_or(StatError::Unavailable("memory usage"))
    }

    fn current_time_label(&self) -> Result<String, StatError> {
        Ok(Local::now().format("%H:%M").to_string())
    }

    fn blocked_query_count(&self) -> Result<u64, StatError> {
        self.with_pihole(|s| s.blocked)
    }

    fn total_query_count(&self) -> Result<u64, StatError> {
        self.with_pihole(|s| s.total)
    }

    fn blocked_percent(&self) -> Result<f32, StatError> {
        self.with_pihole(PiholeStats::blocked_ratio)
    }

    fn top_client_label(&self) -> Result<String, StatError> {
        self.with_pihole(|s| s.top_client.clone())
    }

    fn active_device_count(&self) -> Result<u32, StatError> {
        self.read().neighbours.ok_or(StatError::Unavailable("neighbour count"))
    }

    fn known_device_count(&self) -> Result<u32, StatError> {
        self.with_pihole(|s| s.known_client_count)
    }

    fn weather_snapshot(&self) -> Result<WeatherSnapshot, StatError> {
        self.read().weather.clone().ok_or(StatError::Unavailable("weather"))
    }
}

/// Run a command, capture stdout, give up after `limit`
pub async fn run_command(program: &str, args: &[&str], limit: Duration) -> Result<String, StatError> {
    let command = format!("{} {}", program, args.join(" "));
    let output = timeout(limit, Command::new(program).args(args).kill_on_drop(true).output())
        .await
        .map_err(|_| StatError::Timeout(command.clone()))??;

    if !output.status.success() {
        return Err(StatError::Command {
            command,
            reason: format!("{} {}", output.status, String::from_utf8_lossy(&output.stderr).trim()),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Keeps a [`HostStatSource`] fresh from a tokio task
pub struct StatPoller {
    source: Arc<HostStatSource>,
    settings: StatSettings,
    metrics: MachineMetrics,
    weather: WeatherClient,
}

/// Handle on a running poller
pub struct PollerHandle {
    stop_tx: mpsc::Sender<()>,
    handle: JoinHandle<()>,
}

impl PollerHandle {
    pub async fn stop(self) {
        if let Err(e) = self.stop_tx.send(()).await {
            debug!("Stat poller already gone: {}", e);
        }
        if let Err(e) = self.handle.await {
            error!("Stat poller failed to join: {}", e);
        }
        info!("Stat polling stopped.");
    }
}

impl StatPoller {
    pub fn new(source: Arc<HostStatSource>, settings: StatSettings) -> Result<Self, StatError> {
        let weather = WeatherClient::new(&settings.weather_location, settings.http_timeout)?;
        Ok(Self {
            source,
            settings,
            metrics: MachineMetrics::new(),
            weather,
        })
    }

    pub fn spawn(self) -> PollerHandle {
        let (stop_tx, stop_rx) = mpsc::channel(1);
        let handle = tokio::spawn(self.run(stop_rx));
        PollerHandle { stop_tx, handle }
    }

    async fn run(mut self, mut stop_rx: mpsc::Receiver<()>) {
        let source = Arc::clone(&self.source);

        let mut system_tick = interval(self.settings.system_poll);
        let mut appliance_tick = interval(self.settings.appliance_poll);
        let mut weather_tick = interval(self.settings.weather_refresh);
        for tick in [&mut system_tick, &mut appliance_tick, &mut weather_tick] {
            tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        }

        info!("Stat polling started");
        loop {
            tokio::select! {
                _ = system_tick.tick() => self.poll_system(),
                _ = appliance_tick.tick() => self.poll_appliance().await,
                _ = source.nudge.notified() => {
                    debug!("Appliance stats refresh requested");
                    self.poll_appliance().await;
                    appliance_tick.reset();
                }
                _ = weather_tick.tick() => self.poll_weather().await,
                _ = stop_rx.recv() => {
                    info!("Stat poller received stop signal. Exiting.");
                    break;
                }
            }
        }
    }

    fn poll_system(&mut self) {
        let cpu = self
            .metrics
            .cpu_load()
            .map_err(|e| warn!("CPU load not read: {}", e))
            .ok();
        let memory = self
            .metrics
            .memory_used()
            .map_err(|e| warn!("Memory usage not read: {}", e))
            .ok();
        self.source.store_system(cpu, memory);
    }

    async fn poll_appliance(&mut self) {
        let (program, args) = pihole::CHRONOMETER;
        match run_command(program, args, self.settings.command_timeout).await {
            Ok(output) => match pihole::parse(&output) {
                Ok(mut stats) => {
                    let known = KnownClients::load(&self.settings.known_clients_path);
                    stats.top_client = known.label(&stats.top_client).to_string();
                    debug!("Appliance stats: {}/{} blocked, top client {}", stats.blocked, stats.total, stats.top_client);
                    self.source.store_pihole(stats);
                }
                Err(e) => warn!("Appliance stats not parsed: {}", e),
            },
            Err(e) => warn!("Appliance stats not acquired: {}", e),
        }

        match self.metrics.neighbours() {
            Ok(count) => self.source.store_neighbours(count),
            Err(e) => warn!("Neighbour table not read: {}", e),
        }
    }

    async fn poll_weather(&mut self) {
        let snapshot = match self.weather.fetch().await {
            Ok(snapshot) => {
                debug!("Weather: {} {}", snapshot.condition, snapshot.temperature_label);
                snapshot
            }
            Err(e) => {
                warn!("Weather service unreachable: {}", e);
                WeatherSnapshot::unreachable()
            }
        };
        self.source.store_weather(snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_source_is_unavailable() {
        let source = HostStatSource::new();
        assert!(matches!(source.cpu_load_percent(), Err(StatError::Unavailable(_))));
        assert!(source.blocked_query_count().is_err());
        assert!(source.weather_snapshot().is_err());
        assert!(source.current_time_label().is_ok());
    }

    #[test]
    fn test_stored_values_are_served() {
        let source = HostStatSource::new();
        source.store_system(Some(12.5), Some(40.0));
        source.store_pihole(PiholeStats {
            blocked: 25,
            total: 100,
            known_client_count: 9,
            top_client: "Work Laptop".to_string(),
            ..Default::default()
        });
        source.store_neighbours(4);

        assert_eq!(source.cpu_load_percent().unwrap(), 12.5);
        assert_eq!(source.memory_percent().unwrap(), 40.0);
        assert_eq!(source.blocked_percent().unwrap(), 0.25);
        assert_eq!(source.top_client_label().unwrap(), "Work Laptop");
        assert_eq!(source.active_device_count().unwrap(), 4);
        assert_eq!(source.known_device_count().unwrap(), 9);
    }

    #[test]
    fn test_failed_system_read_keeps_previous() {
        let source = HostStatSource::new();
        source.store_system(Some(10.0), Some(20.0));
        source.store_system(None, Some(30.0));
        assert_eq!(source.cpu_load_percent().unwrap(), 10.0);
        assert_eq!(source.memory_percent().unwrap(), 30.0);
    }

    #[test]
    fn test_time_label_format() {
        let label = HostStatSource::new().current_time_label().unwrap();
        assert_eq!(label.len(), 5);
        assert_eq!(&label[2..3], ":");
    }

    #[tokio::test]
    async fn test_refresh_wakes_waiter() {
        let source = Arc::new(HostStatSource::new());
        source.refresh().unwrap();
        // permit is stored even with nobody waiting yet
        timeout(Duration::from_millis(100), source.nudge.notified())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_run_command_reports_failure() {
        let result = run_command("false", &[], Duration::from_secs(2)).await;
        assert!(matches!(result, Err(StatError::Command { .. })));

        let result = run_command("sleep", &["5"], Duration::from_millis(50)).await;
        assert!(matches!(result, Err(StatError::Timeout(_))));

        let output = run_command("echo", &["hello"], Duration::from_secs(2)).await.unwrap();
        assert_eq!(output.trim(), "hello");
    }

    #[tokio::test]
    async fn test_poller_stops() {
        let source = Arc::new(HostStatSource::new());
        let settings = StatSettings {
            weather_location: "nowhere".to_string(),
            weather_refresh: Duration::from_secs(3600),
            http_timeout: Duration::from_millis(10),
            known_clients_path: PathBuf::from("/nonexistent/known_clients"),
            appliance_poll: Duration::from_secs(3600),
            command_timeout: Duration::from_millis(100),
            system_poll: Duration::from_millis(10),
        };
        let handle = StatPoller::new(source.clone(), settings).unwrap().spawn();
        tokio::time::sleep(Duration::from_millis(300)).await;
        timeout(Duration::from_secs(2), handle.stop()).await.unwrap();
        // weather was attempted on the first tick, unreachable or not it is cached
        assert!(source.weather_snapshot().is_ok());
    }
}
