/*
 *  main.rs
 *
 *  holemon - the hole at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Wires config, stats, display and housekeeping together
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

use clap::Parser;
use env_logger::Env;
use log::{error, info, warn};
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::watch;

use holemon::config::{self, Cli};
use holemon::display::{
    Controller, DisplayDriverFactory, DisplayEngine, EngineConfig, EngineHandle, FrameSurface, SnapshotPublisher,
};
use holemon::housekeeper::{run_demo, Housekeeper, HousekeeperSettings};
use holemon::network::{NetworkManager, WpsPairing};
use holemon::stats::{HostStatSource, StatPoller, StatSettings};
use holemon::BUILD_DATE;

const RENDER_JOIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Asynchronously waits for a SIGINT, SIGTERM, or SIGHUP signal.
async fn signal_handler() -> anyhow::Result<()> {
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sighup = signal(SignalKind::hangup())?;

    tokio::select! {
        _ = sigint.recv() => {
            info!("SIGINT received. Initiating graceful shutdown.");
        }
        _ = sigterm.recv() => {
            info!("SIGTERM received. Initiating graceful shutdown.");
        }
        _ = sighup.recv() => {
            info!("SIGHUP received. Initiating graceful shutdown.");
        }
    }
    Ok(())
}

/// Resolves once the render thread is gone
async fn render_exited(engine: &EngineHandle) {
    while !engine.is_finished() {
        tokio::time::sleep(Duration::from_millis(250)).await;
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load(&cli)?;

    if cli.dump_config {
        println!("{}", config::dump(&cfg)?);
        return Ok(());
    }

    env_logger::Builder::from_env(Env::default().default_filter_or(cfg.log_level()))
        .format_timestamp_secs()
        .init();

    info!("This {} keeps an eye on the hole", env!("CARGO_PKG_NAME"));
    info!("v.{} built {}", env!("CARGO_PKG_VERSION"), BUILD_DATE);

    let driver = DisplayDriverFactory::create_from_config(&cfg.display())?;
    let surface = FrameSurface::new(driver);

    let controller = Arc::new(Controller::new());
    let stats = Arc::new(HostStatSource::new());
    let poller = StatPoller::new(Arc::clone(&stats), StatSettings::from_config(&cfg))?.spawn();

    let (publisher, snapshots) = SnapshotPublisher::channel();
    controller.attach(Arc::new(publisher));
    let engine = DisplayEngine::new(surface, Arc::clone(&stats), snapshots, EngineConfig::from_config(&cfg)).spawn()?;

    let (stop_tx, stop_rx) = watch::channel(false);
    let worker = if cli.demo {
        info!("Running progress demo");
        tokio::spawn(run_demo(Arc::clone(&controller), stop_rx, 50, Duration::from_millis(200)))
    } else {
        let housekeeper = Housekeeper::new(
            Arc::clone(&controller),
            NetworkManager::from_config(&cfg),
            WpsPairing::from_config(&cfg),
            HousekeeperSettings::from_config(&cfg),
        );
        tokio::spawn(housekeeper.run(stop_rx))
    };

    tokio::select! {
        res = signal_handler() => {
            if let Err(e) = res {
                error!("Signal handling failed: {}", e);
            }
        }
        _ = render_exited(&engine) => {
            warn!("Render loop exited, shutting down");
        }
    }

    let _ = stop_tx.send(true);
    if let Err(e) = worker.await {
        error!("Housekeeping task failed: {}", e);
    }
    controller.clear();

    let rendered = engine.shutdown(RENDER_JOIN_TIMEOUT);
    poller.stop().await;

    rendered?;
    info!("Shutdown complete");
    Ok(())
}
