/*
 *  network.rs
 *
 *  holemon - the hole at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Connectivity checks and WPS push-button pairing
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

use std::future::Future;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use local_ip_address::local_ip;
use log::{debug, info, warn};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::process::Command;
use tokio::time::{sleep, timeout};

use crate::config::Config;
use crate::stats::metrics::count_neighbours;

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("`{command}` failed: {reason}")]
    Command { command: String, reason: String },

    #[error("`{0}` timed out")]
    Timeout(String),
}

/// Is the outside world reachable
pub trait Connectivity: Send + Sync {
    fn is_online(&self) -> impl Future<Output = bool> + Send;
}

/// One attempt at joining a wireless network without typing a passphrase
pub trait Pairing: Send + Sync {
    /// Ok(true) when the attempt left the host with a usable network entry
    fn pair(&self) -> impl Future<Output = Result<bool, NetworkError>> + Send;
}

/// TCP connect to `host:port` within `limit`
pub async fn check_internet_connection(host: &str, port: u16, limit: Duration) -> bool {
    match timeout(limit, TcpStream::connect((host, port))).await {
        Ok(Ok(_)) => true,
        Ok(Err(e)) => {
            debug!("Connectivity check to {}:{} failed: {}", host, port, e);
            false
        }
        Err(_) => {
            debug!("Connectivity check to {}:{} timed out", host, port);
            false
        }
    }
}

/// Address of the interface used for the default route
pub fn local_address() -> Option<IpAddr> {
    local_ip().map_err(|e| debug!("No local address: {}", e)).ok()
}

/// Neighbours in the ARP table; a rough hint that the LAN is up
pub async fn neighbour_count() -> Result<u32, NetworkError> {
    let arp = tokio::fs::read_to_string("/proc/net/arp").await?;
    Ok(count_neighbours(&arp))
}

/// Connectivity against a well known host
#[derive(Debug, Clone)]
pub struct NetworkManager {
    host: String,
    port: u16,
    limit: Duration,
}

impl NetworkManager {
    pub const CHECK_TIMEOUT: Duration = Duration::from_secs(3);

    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, limit: Self::CHECK_TIMEOUT }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(&cfg.check_host(), cfg.check_port())
    }

    pub fn with_timeout(mut self, limit: Duration) -> Self {
        self.limit = limit;
        self
    }
}

impl Connectivity for NetworkManager {
    fn is_online(&self) -> impl Future<Output = bool> + Send {
        async move {
            let online = check_internet_connection(&self.host, self.port, self.limit).await;
            if online {
                if let Some(ip) = local_address() {
                    debug!("Online as {}", ip);
                }
            } else {
                match neighbour_count().await {
                    Ok(n) if n > 0 => info!("Internet unreachable, {} LAN neighbours visible", n),
                    Ok(_) => info!("Internet unreachable, no LAN neighbours"),
                    Err(e) => debug!("Neighbour table not read: {}", e),
                }
            }
            online
        }
    }
}

/// Delays of the WPS sequence
#[derive(Debug, Clone, Copy)]
struct WpsTimings {
    /// After killing the supplicant, before restarting it
    settle: Duration,
    /// After pressing the virtual button, for the router to answer
    button_wait: Duration,
    /// Limit for each external command
    command_timeout: Duration,
    /// How recent the config write must be to count as this pairing
    fresh_within: Duration,
}

impl Default for WpsTimings {
    fn default() -> Self {
        Self {
            settle: Duration::from_secs(3),
            button_wait: Duration::from_secs(10),
            command_timeout: Duration::from_secs(10),
            fresh_within: Duration::from_secs(20),
        }
    }
}

/// WPS push-button pairing through wpa_supplicant and wpa_cli
#[derive(Debug, Clone)]
pub struct WpsPairing {
    interface: String,
    conf: PathBuf,
    timings: WpsTimings,
}

impl WpsPairing {
    pub fn new(interface: &str, conf: &Path) -> Self {
        Self {
            interface: interface.to_string(),
            conf: conf.to_path_buf(),
            timings: WpsTimings::default(),
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(&cfg.interface(), &cfg.wpa_supplicant_conf())
    }

    async fn run(&self, program: &str, args: &[&str]) -> Result<String, NetworkError> {
        let command = format!("{} {}", program, args.join(" "));
        debug!("Running {}", command);
        let output = timeout(self.timings.command_timeout, Command::new(program).args(args).kill_on_drop(true).output())
            .await
            .map_err(|_| NetworkError::Timeout(command.clone()))??;
        if !output.status.success() {
            return Err(NetworkError::Command {
                command,
                reason: format!("{} {}", output.status, String::from_utf8_lossy(&output.stderr).trim()),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn stop_supplicant(&self) {
        // nothing running is not an error here
        if let Err(e) = self.run("killall", &["-q", "wpa_supplicant"]).await {
            debug!("wpa_supplicant not stopped: {}", e);
        }
        sleep(self.timings.settle).await;
    }

    async fn start_supplicant(&self, extra: &[&str]) -> Result<(), NetworkError> {
        let conf = self.conf.to_string_lossy();
        let mut args: Vec<&str> = vec!["-B"];
        args.extend_from_slice(extra);
        args.extend_from_slice(&["-i", self.interface.as_str(), "-c", &*conf]);
        self.run("wpa_supplicant", &args).await.map(|_| ())
    }

    /// Restart the supplicant on the freshly written config
    async fn reconnect(&self) -> Result<(), NetworkError> {
        self.stop_supplicant().await;
        self.start_supplicant(&["-D", "wext"]).await
    }
}

impl Pairing for WpsPairing {
    fn pair(&self) -> impl Future<Output = Result<bool, NetworkError>> + Send {
        async move {
            info!("Starting WPS pairing on {}", self.interface);
            self.stop_supplicant().await;
            self.start_supplicant(&[]).await?;

            let iface = format!("-i{}", self.interface);
            let reply = self.run("wpa_cli", &[iface.as_str(), "wps_pbc"]).await?;
            sleep(self.timings.button_wait).await;

            if !reply.to_lowercase().contains("ok") {
                warn!("wpa_cli refused WPS: {}", reply.trim());
                return Ok(false);
            }

            if !wps_succeeded(&self.conf, SystemTime::now(), self.timings.fresh_within) {
                info!("WPS finished without a new network entry");
                return Ok(false);
            }

            self.reconnect().await?;
            info!("WPS pairing succeeded");
            Ok(true)
        }
    }
}

/// A pairing took when the config was written within `fresh_within` of
/// `now` and holds at least one `network=` block
pub fn wps_succeeded(conf: &Path, now: SystemTime, fresh_within: Duration) -> bool {
    let modified = match std::fs::metadata(conf).and_then(|m| m.modified()) {
        Ok(modified) => modified,
        Err(e) => {
            debug!("{} not inspected: {}", conf.display(), e);
            return false;
        }
    };
    let age = now.duration_since(modified).unwrap_or(Duration::ZERO);
    if age > fresh_within {
        return false;
    }
    std::fs::read_to_string(conf)
        .map(|content| count_networks(&content) > 0)
        .unwrap_or(false)
}

pub fn count_networks(conf: &str) -> usize {
    conf.lines().filter(|l| l.trim_start().starts_with("network=")).count()
}
