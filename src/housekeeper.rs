/*
 *  housekeeper.rs
 *
 *  holemon - the hole at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Decides what the display shows: boot, connectivity recovery, stats
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

use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};
use tokio::sync::watch;
use tokio::time::sleep;

use crate::config::Config;
use crate::display::controller::Controller;
use crate::display::mode::Severity;
use crate::network::{Connectivity, Pairing};

#[derive(Debug, Clone, Copy)]
pub struct HousekeeperSettings {
    /// How long the boot animation plays
    pub intro: Duration,
    /// Pause between connectivity checks
    pub check_interval: Duration,
    pub pairing_attempts: u32,
    /// How long a pairing outcome stays on screen before the stats return
    pub outcome_hold: Duration,
}

impl HousekeeperSettings {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            intro: cfg.intro_duration(),
            check_interval: cfg.check_interval(),
            pairing_attempts: cfg.pairing_attempts(),
            outcome_hold: Duration::from_secs(5),
        }
    }
}

/// Resolves once `stop` turns true or its sender is dropped
async fn stopped(stop: &mut watch::Receiver<bool>) {
    // the borrow guard is not Send, drop it before returning
    let _ = stop.wait_for(|stopped| *stopped).await;
}

/// Sleep for `period`; false when a stop was requested meanwhile
async fn pause(stop: &mut watch::Receiver<bool>, period: Duration) -> bool {
    if *stop.borrow() {
        return false;
    }
    tokio::select! {
        _ = sleep(period) => true,
        _ = stopped(stop) => false,
    }
}

/// Orchestrates the controller from a tokio task.
///
/// Boots into the intro, then keeps the stats carousel up while the
/// network is reachable and walks through WPS pairing when it is not.
pub struct Housekeeper<C: Connectivity, P: Pairing> {
    controller: Arc<Controller>,
    connectivity: C,
    pairing: P,
    settings: HousekeeperSettings,
}

impl<C: Connectivity, P: Pairing> Housekeeper<C, P> {
    pub fn new(controller: Arc<Controller>, connectivity: C, pairing: P, settings: HousekeeperSettings) -> Self {
        Self { controller, connectivity, pairing, settings }
    }

    /// Run until `stop` turns true (or its sender goes away), then clear
    pub async fn run(self, mut stop: watch::Receiver<bool>) {
        info!("Housekeeper starting");
        self.controller.intro();

        if pause(&mut stop, self.settings.intro).await {
            loop {
                if self.connectivity.is_online().await {
                    self.controller.cycle();
                } else if !self.recover(&mut stop).await {
                    break;
                }
                if !pause(&mut stop, self.settings.check_interval).await {
                    break;
                }
            }
        }

        self.controller.clear();
        info!("Housekeeper stopped");
    }

    /// Pairing attempts until one takes or they run out, false on stop
    async fn recover(&self, stop: &mut watch::Receiver<bool>) -> bool {
        let attempts = self.settings.pairing_attempts.max(1);
        warn!("Network unreachable, trying WPS ({} attempts)", attempts);

        for attempt in 1..=attempts {
            self.controller.connection(false, attempt, vec!["No connection".to_string(), "Starting WPS".to_string()]);

            let outcome = tokio::select! {
                outcome = self.pairing.pair() => outcome,
                _ = stopped(stop) => return false,
            };

            match outcome {
                Ok(true) => {
                    info!("Paired on attempt {}", attempt);
                    self.controller.connection(true, attempt, vec!["Connected".to_string(), "WPS paired".to_string()]);
                    return self.resume(stop).await;
                }
                Ok(false) => warn!("WPS attempt {} of {} did not pair", attempt, attempts),
                Err(e) => warn!("WPS attempt {} of {} failed: {}", attempt, attempts, e),
            }
        }

        self.controller.message(
            Severity::Error,
            vec!["WPS pairing failed".to_string(), format!("after {} attempts", attempts)],
        );
        self.resume(stop).await
    }

    /// Hold the outcome on screen, then back to the carousel
    async fn resume(&self, stop: &mut watch::Receiver<bool>) -> bool {
        if !pause(stop, self.settings.outcome_hold).await {
            return false;
        }
        self.controller.cycle();
        true
    }
}

/// Walk a fake firmware update from 0 to 100 %
pub async fn progress_demo(controller: &Controller, steps: u32, step: Duration) {
    let steps = steps.max(1);
    for i in 1..steps {
        let percentage = i as f32 / steps as f32;
        controller.progress("UPDATING", "FIRMWARE", percentage, "UPDATE", "FINISHED");
        sleep(step).await;
    }
    controller.progress("UPDATING", "FIRMWARE", 1.0, "UPDATE", "FINISHED");
}

/// `--demo` task: the progress demo, then the finished gauge stays up
/// until `stop`, then clear
pub async fn run_demo(controller: Arc<Controller>, mut stop: watch::Receiver<bool>, steps: u32, step: Duration) {
    let finished = tokio::select! {
        _ = progress_demo(&controller, steps, step) => true,
        _ = stopped(&mut stop) => false,
    };
    if finished {
        info!("Demo finished");
        stopped(&mut stop).await;
    }
    controller.clear();
}
