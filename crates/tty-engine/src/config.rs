//! Subsystem configuration
//!
//! All tunables live in one serde-derived struct so the server binary can
//! load them from a JSON file; `Default` yields a runnable setup for the
//! two standard lines.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::state::DeviceId;

/// Configuration for one physical line and its terminal file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineConfig {
    /// Device file path of the raw serial port
    pub device_path: String,
    /// Terminal file path consumers open
    pub terminal_path: String,
    /// Capacity of the inbound ring buffer in bytes
    pub read_buffer_bytes: usize,
    /// Baud rate used when opening the real serial port
    pub baud_rate: u32,
}

/// Top-level subsystem configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtyConfig {
    /// First serial line
    pub serial1: LineConfig,
    /// Second serial line
    pub serial2: LineConfig,
    /// Maximum number of concurrently open sessions
    pub max_sessions: usize,
    /// Largest single read issued against a device file
    pub read_chunk_bytes: usize,
    /// Bounded wait of the drain loop before re-entering, in milliseconds
    pub poll_interval_ms: u64,
    /// Depth of the outbound readiness-notice queue
    pub notify_queue_depth: usize,
    /// Run against simulated lines instead of real serial hardware
    #[serde(default)]
    pub simulate: bool,
}

impl Default for TtyConfig {
    fn default() -> Self {
        Self {
            serial1: LineConfig {
                device_path: "/serial1".to_string(),
                terminal_path: "/ttyS1".to_string(),
                read_buffer_bytes: 2048,
                baud_rate: 115_200,
            },
            serial2: LineConfig {
                device_path: "/serial2".to_string(),
                terminal_path: "/ttyS2".to_string(),
                read_buffer_bytes: 2048,
                baud_rate: 115_200,
            },
            max_sessions: 64,
            read_chunk_bytes: 512,
            poll_interval_ms: 1000,
            notify_queue_depth: 32,
            simulate: false,
        }
    }
}

impl TtyConfig {
    /// Line configuration for `device`.
    pub fn line(&self, device: DeviceId) -> &LineConfig {
        match device {
            DeviceId::Serial1 => &self.serial1,
            DeviceId::Serial2 => &self.serial2,
        }
    }

    /// Drain-loop wait bound as a [`Duration`].
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
