/*
 *  config.rs
 *
 *  holemon - the hole at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Layered configuration: defaults, YAML file, command line overrides
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

use clap::{ArgAction, Parser, ValueHint};
use dirs_next::home_dir;
use serde::{Deserialize, Serialize};
use std::{fs, path::{Path, PathBuf}, time::Duration};
use thiserror::Error;

/// Error type for config loading/validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Top-level app configuration. Every group is optional, missing values
/// resolve to the defaults below.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub log_level: Option<String>,     // e.g., "info" | "debug"
    pub display: Option<DisplayConfig>,
    pub engine: Option<EngineSection>,
    pub weather: Option<WeatherSection>,
    pub pihole: Option<PiholeSection>,
    pub network: Option<NetworkSection>,
    pub boot: Option<BootSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DisplayConfig {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub rotate_deg: Option<u16>,
    pub invert: Option<bool>,
    pub brightness: Option<u8>,     // 0-255
    pub driver: Option<DriverKind>,
    pub bus: Option<BusConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EngineSection {
    pub fps: Option<u32>,
    pub dwell_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WeatherSection {
    /// wttr.in location, city name or lat,lon; empty lets the service geolocate
    pub location: Option<String>,
    pub refresh_mins: Option<u64>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PiholeSection {
    /// `<client id> <display name>` per line
    pub known_clients: Option<PathBuf>,
    pub poll_secs: Option<u64>,
    pub command_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NetworkSection {
    pub check_host: Option<String>,
    pub check_port: Option<u16>,
    pub check_interval_secs: Option<u64>,
    pub pairing_attempts: Option<u32>,
    pub wpa_supplicant_conf: Option<PathBuf>,
    pub interface: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BootSection {
    pub intro_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BusConfig {
    I2c {
        bus: String,        // e.g. "/dev/i2c-1"
        address: u8,        // e.g. 0x3C (I2C addresses are 7-bit, stored in u8)
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DriverKind {
    Ssd1306,
    Mock,
}

/// CLI overrides. All fields are Options so we can layer them over YAML.
#[derive(Debug, Parser, Clone, Default)]
#[command(name = "holemon", version, about = "Pi-hole status monitor for small OLED panels")]
pub struct Cli {
    /// Path to a YAML config file (overrides search)
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub log_level: Option<String>,
    /// shorthand for --log-level debug
    #[arg(long, action = ArgAction::SetTrue)]
    pub debug: bool,
    #[arg(long, value_enum)]
    pub driver: Option<DriverKind>,
    #[arg(long)]
    pub display_width: Option<u32>,
    #[arg(long)]
    pub display_height: Option<u32>,
    #[arg(long)]
    pub display_rotate_deg: Option<u16>,
    #[arg(long, action = ArgAction::Set)]
    pub display_invert: Option<bool>,
    #[arg(long)]
    pub fps: Option<u32>,
    #[arg(long)]
    pub dwell_secs: Option<u64>,
    #[arg(long)]
    pub location: Option<String>,
    /// dump fully merged config (after overrides) and exit
    #[arg(long, action = ArgAction::SetTrue)]
    pub dump_config: bool,
    /// run the firmware update progress demo instead of monitoring
    #[arg(long, action = ArgAction::SetTrue)]
    pub demo: bool,
}

/// Merge YAML and CLI over the defaults and validate.
pub fn load(cli: &Cli) -> Result<Config, ConfigError> {
    // 1) defaults (from `Default` impl)
    let mut cfg = Config::default();

    // 2) YAML file (explicit path or search)
    if let Some(p) = cli.config.as_ref() {
        if p.exists() {
            let y = read_yaml(p)?;
            merge(&mut cfg, y);
        } else {
            return Err(ConfigError::Validation(format!(
                "Config file not found: {}",
                p.display()
            )));
        }
    } else if let Some(p) = find_config_file() {
        let y = read_yaml(&p)?;
        merge(&mut cfg, y);
    }

    // 3) CLI overrides (highest precedence)
    apply_cli_overrides(&mut cfg, cli);

    // 4) Validate
    validate(&cfg)?;

    Ok(cfg)
}

/// Pretty YAML of effective config
pub fn dump(cfg: &Config) -> Result<String, ConfigError> {
    Ok(serde_yaml::to_string(cfg)?)
}

/// Try common locations in order (first hit wins).
fn find_config_file() -> Option<PathBuf> {
    // XDG-style: ~/.config/holemon/config.yaml
    if let Some(home) = home_dir() {
        let p = home.join(".config/holemon/config.yaml");
        if p.exists() { return Some(p) }
        let p = home.join(".config/holemon.yaml");
        if p.exists() { return Some(p) }
    }
    // project local
    for candidate in &["holemon.yaml", "config/holemon.yaml"] {
        let p = PathBuf::from(candidate);
        if p.exists() { return Some(p) }
    }
    None
}

fn read_yaml(path: &Path) -> Result<Config, ConfigError> {
    let s = fs::read_to_string(path)?;
    parse_yaml(&s)
}

pub fn parse_yaml(s: &str) -> Result<Config, ConfigError> {
    let cfg: Config = serde_yaml::from_str(s)?;
    Ok(cfg)
}

// Field by field: a value present in `src` wins
macro_rules! take_some {
    ($dst:expr, $src:expr, $($field:ident),+) => {{
        $( if $src.$field.is_some() { $dst.$field = $src.$field; } )+
    }};
}

// Group by group: a group only `src` has is taken whole
macro_rules! merge_group {
    ($dst:expr, $src:expr, $($field:ident),+) => {
        if let Some(s) = $src {
            if let Some(d) = $dst.as_mut() {
                take_some!(d, s, $($field),+);
            } else {
                $dst = Some(s);
            }
        }
    };
}

/// Shallow merge `src` into `dst`, Option-by-Option.
fn merge(dst: &mut Config, src: Config) {
    if src.log_level.is_some() { dst.log_level = src.log_level; }
    merge_group!(dst.display, src.display, width, height, rotate_deg, invert, brightness, driver, bus);
    merge_group!(dst.engine, src.engine, fps, dwell_secs);
    merge_group!(dst.weather, src.weather, location, refresh_mins, timeout_secs);
    merge_group!(dst.pihole, src.pihole, known_clients, poll_secs, command_timeout_secs);
    merge_group!(
        dst.network, src.network,
        check_host, check_port, check_interval_secs, pairing_attempts, wpa_supplicant_conf, interface
    );
    merge_group!(dst.boot, src.boot, intro_secs);
}

fn apply_cli_overrides(cfg: &mut Config, cli: &Cli) {
    if cli.log_level.is_some() { cfg.log_level = cli.log_level.clone(); }
    if cli.debug { cfg.log_level = Some("debug".to_string()); }

    let display_case = cli.driver.is_some()
        || cli.display_width.is_some()
        || cli.display_height.is_some()
        || cli.display_rotate_deg.is_some()
        || cli.display_invert.is_some();
    if display_case {
        let display = cfg.display.get_or_insert_with(DisplayConfig::default);
        if cli.driver.is_some()              { display.driver = cli.driver; }
        if cli.display_width.is_some()       { display.width = cli.display_width; }
        if cli.display_height.is_some()      { display.height = cli.display_height; }
        if cli.display_rotate_deg.is_some()  { display.rotate_deg = cli.display_rotate_deg; }
        if cli.display_invert.is_some()      { display.invert = cli.display_invert; }
    }

    if cli.fps.is_some() || cli.dwell_secs.is_some() {
        let engine = cfg.engine.get_or_insert_with(EngineSection::default);
        if cli.fps.is_some()        { engine.fps = cli.fps; }
        if cli.dwell_secs.is_some() { engine.dwell_secs = cli.dwell_secs; }
    }

    if cli.location.is_some() {
        cfg.weather.get_or_insert_with(WeatherSection::default).location = cli.location.clone();
    }
}

/// Put any invariants here (required fields, ranges, etc.)
fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if let Some(display) = cfg.display.as_ref() {
        if display.width == Some(0) || display.height == Some(0) {
            return Err(ConfigError::Validation("display width/height must be > 0".into()));
        }
        if let Some(rot) = display.rotate_deg {
            match rot {
                0 | 90 | 180 | 270 => {},
                _ => return Err(ConfigError::Validation("display rotate_deg must be 0|90|180|270".into()))
            }
        }
    }
    if let Some(engine) = cfg.engine.as_ref() {
        if let Some(fps) = engine.fps {
            if !(1..=60).contains(&fps) {
                return Err(ConfigError::Validation("engine fps must be 1..=60".into()));
            }
        }
        if engine.dwell_secs == Some(0) {
            return Err(ConfigError::Validation("engine dwell_secs must be >= 1".into()));
        }
    }
    if cfg.network.as_ref().and_then(|n| n.pairing_attempts) == Some(0) {
        return Err(ConfigError::Validation("network pairing_attempts must be >= 1".into()));
    }
    Ok(())
}

// Resolved views with defaults applied

pub const DEFAULT_FPS: u32 = 30;
pub const DEFAULT_DWELL_SECS: u64 = 10;

impl Config {
    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or("info")
    }

    pub fn display(&self) -> DisplayConfig {
        let mut display = self.display.clone().unwrap_or_default();
        display.driver.get_or_insert(DriverKind::Ssd1306);
        display.width.get_or_insert(128);
        display.height.get_or_insert(32);
        if display.bus.is_none() {
            display.bus = Some(BusConfig::I2c { bus: "/dev/i2c-1".to_string(), address: 0x3C });
        }
        display
    }

    pub fn fps(&self) -> u32 {
        self.engine.as_ref().and_then(|e| e.fps).unwrap_or(DEFAULT_FPS)
    }

    pub fn dwell(&self) -> Duration {
        Duration::from_secs(self.engine.as_ref().and_then(|e| e.dwell_secs).unwrap_or(DEFAULT_DWELL_SECS))
    }

    pub fn weather_location(&self) -> String {
        self.weather.as_ref().and_then(|w| w.location.clone()).unwrap_or_default()
    }

    pub fn weather_refresh(&self) -> Duration {
        Duration::from_secs(60 * self.weather.as_ref().and_then(|w| w.refresh_mins).unwrap_or(5))
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.weather.as_ref().and_then(|w| w.timeout_secs).unwrap_or(5))
    }

    pub fn known_clients_path(&self) -> PathBuf {
        self.pihole
            .as_ref()
            .and_then(|p| p.known_clients.clone())
            .unwrap_or_else(|| PathBuf::from("/etc/holemon/known_clients"))
    }

    pub fn stats_poll(&self) -> Duration {
        Duration::from_secs(self.pihole.as_ref().and_then(|p| p.poll_secs).unwrap_or(30))
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.pihole.as_ref().and_then(|p| p.command_timeout_secs).unwrap_or(2))
    }

    pub fn check_host(&self) -> String {
        self.network
            .as_ref()
            .and_then(|n| n.check_host.clone())
            .unwrap_or_else(|| "8.8.8.8".to_string())
    }

    pub fn check_port(&self) -> u16 {
        self.network.as_ref().and_then(|n| n.check_port).unwrap_or(53)
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.network.as_ref().and_then(|n| n.check_interval_secs).unwrap_or(60))
    }

    pub fn pairing_attempts(&self) -> u32 {
        self.network.as_ref().and_then(|n| n.pairing_attempts).unwrap_or(3)
    }

    pub fn wpa_supplicant_conf(&self) -> PathBuf {
        self.network
            .as_ref()
            .and_then(|n| n.wpa_supplicant_conf.clone())
            .unwrap_or_else(|| PathBuf::from("/etc/wpa_supplicant/wpa_supplicant.conf"))
    }

    pub fn interface(&self) -> String {
        self.network
            .as_ref()
            .and_then(|n| n.interface.clone())
            .unwrap_or_else(|| "wlan0".to_string())
    }

    pub fn intro_duration(&self) -> Duration {
        Duration::from_secs(self.boot.as_ref().and_then(|b| b.intro_secs).unwrap_or(3))
    }
}
