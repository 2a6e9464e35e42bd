//! Device drain loops
//!
//! The multiplexer pulls bytes out of the raw device files and into the
//! per-device ring buffers. Each device gets its own spawned task sitting
//! in a bounded-timeout read; the async reactor underneath plays the role
//! of the classic multiplexed wait over the descriptor set.
//!
//! Every drained batch is echoed back to its originating line (best
//! effort) and then ingested, which raises the read-ready edge at most
//! once per batch. The loops are the process's steady state: timeouts,
//! short reads, and read errors all just re-enter the wait, and nothing
//! here ever closes a device.

use std::sync::Arc;

use tokio::io::AsyncReadExt;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use tty_buffer::echo;

use crate::device::DeviceEndpoint;
use crate::subsystem::TerminalSubsystem;

/// Owns the opened device endpoints until the drain tasks are spawned.
pub struct DeviceMultiplexer {
    subsystem: Arc<TerminalSubsystem>,
    endpoints: Vec<DeviceEndpoint>,
}

impl DeviceMultiplexer {
    /// Prepare drain loops for `endpoints`.
    pub fn new(subsystem: Arc<TerminalSubsystem>, endpoints: Vec<DeviceEndpoint>) -> Self {
        Self {
            subsystem,
            endpoints,
        }
    }

    /// Spawn one drain task per device and return their handles.
    /// The tasks run until the process exits.
    pub fn spawn(self) -> Vec<JoinHandle<()>> {
        let Self {
            subsystem,
            endpoints,
        } = self;
        endpoints
            .into_iter()
            .map(|endpoint| tokio::spawn(drain_device(Arc::clone(&subsystem), endpoint)))
            .collect()
    }
}

async fn drain_device(subsystem: Arc<TerminalSubsystem>, endpoint: DeviceEndpoint) {
    let DeviceEndpoint {
        device,
        mut reader,
        writer,
    } = endpoint;

    let poll = subsystem.config().poll_interval();
    let mut buf = vec![0u8; subsystem.config().read_chunk_bytes.max(1)];

    info!("drain loop started for {device}");

    loop {
        match timeout(poll, reader.read(&mut buf)).await {
            // Timed out with no events: not an error, re-enter the wait
            Err(_) => continue,

            Ok(Ok(0)) => {
                // Idle or vanished line; nothing to drain until the next tick
                sleep(poll).await;
            }

            Ok(Ok(n)) => {
                let batch = &buf[..n];
                debug!("{device}: drained {n} bytes");

                // Echo is best effort and must never fail the read path
                let image = echo::transcode(batch);
                if let Err(err) = writer.write(&image).await {
                    warn!("{device}: echo write failed: {err}");
                }

                subsystem.controller().ingest(device, batch);
            }

            // A failed device read is "nothing available", not a reason
            // to close the device
            Ok(Err(err)) => warn!("{device}: device read failed: {err}"),
        }
    }
}
