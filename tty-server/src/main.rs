//! ttyline terminal server
//!
//! Wires the line-discipline engine to its environment: loads the
//! configuration, opens the two serial lines (real hardware or simulated),
//! spawns the drain loops and the request dispatcher, and announces the
//! terminal paths. Consumer requests arrive through the external
//! virtual-filesystem transport, which clones the request sender this
//! binary keeps alive; readiness notices flow back out the same way.
//!
//! Usage: `tty-server [config.json]`. With no argument the default
//! configuration serves `/serial1` and `/serial2` as `/ttyS1` and
//! `/ttyS2`; set `"simulate": true` in the config to run without
//! hardware.

use std::env;
use std::fs;
use std::time::Duration;

use anyhow::Context;
use tokio::sync::mpsc;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tty_engine::{launch, DeviceEndpoint, DeviceId, TtyConfig};
use tty_sim::{virtual_line, VirtualSerialLine};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tty_server=info,tty_engine=info,tty_sim=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("starting ttyline terminal server");

    let config = load_config()?;
    let (endpoints, sim_lines) = open_endpoints(&config)?;

    let (request_tx, request_rx) = mpsc::channel(256);
    let (notify_tx, mut notify_rx) = mpsc::channel(config.notify_queue_depth);

    let (_subsystem, _tasks) = launch(config, endpoints, request_rx, notify_tx);

    // The VFS transport glue clones this sender to deliver consumer
    // requests; it must stay alive for the server's lifetime or the
    // dispatcher sees a closed channel and stops.
    let _transport_tx = request_tx;

    // Readiness notices go to whatever mounted the terminal paths; the
    // actual notify_ready call lives in the external transport.
    tokio::spawn(async move {
        while let Some(notice) = notify_rx.recv().await {
            info!("ready notice: {} {}", notice.path, notice.readiness);
        }
    });

    if let Some(lines) = sim_lines {
        spawn_sim_observers(lines);
    }

    tokio::signal::ctrl_c()
        .await
        .context("waiting for shutdown signal")?;
    info!("shutdown requested");

    Ok(())
}

/// Load the config file named on the command line, or fall back to the
/// default two-line setup.
fn load_config() -> anyhow::Result<TtyConfig> {
    match env::args().nth(1) {
        Some(path) => {
            let raw = fs::read_to_string(&path)
                .with_context(|| format!("reading config file {path}"))?;
            let config: TtyConfig =
                serde_json::from_str(&raw).with_context(|| format!("parsing config {path}"))?;
            info!("loaded configuration from {path}");
            Ok(config)
        }
        None => Ok(TtyConfig::default()),
    }
}

/// Open both device endpoints. In simulation mode the far ends of the
/// virtual lines are returned so the binary can keep them alive and
/// observe line output.
#[allow(clippy::type_complexity)]
fn open_endpoints(
    config: &TtyConfig,
) -> anyhow::Result<(Vec<DeviceEndpoint>, Option<Vec<(DeviceId, VirtualSerialLine)>>)> {
    if config.simulate {
        info!("running against simulated lines");
        let mut endpoints = Vec::new();
        let mut lines = Vec::new();
        for device in DeviceId::ALL {
            let (stream, line) = virtual_line(4096);
            endpoints.push(DeviceEndpoint::from_stream(device, stream));
            lines.push((device, line));
        }
        return Ok((endpoints, Some(lines)));
    }

    let mut endpoints = Vec::new();
    for device in DeviceId::ALL {
        let line = config.line(device);
        let endpoint = DeviceEndpoint::open_serial(device, &line.device_path, line.baud_rate)
            .with_context(|| format!("opening {} for {device}", line.device_path))?;
        info!("opened {} at {} baud", line.device_path, line.baud_rate);
        endpoints.push(endpoint);
    }
    Ok((endpoints, None))
}

/// Keep the simulated far ends alive and log whatever the server puts on
/// the wire (echo and consumer writes).
fn spawn_sim_observers(lines: Vec<(DeviceId, VirtualSerialLine)>) {
    for (device, mut line) in lines {
        tokio::spawn(async move {
            loop {
                let out = line.drain_output(Duration::from_millis(500)).await;
                if !out.is_empty() {
                    debug!("{device}: line output {:02X?}", &out[..out.len().min(32)]);
                }
            }
        });
    }
}
