//! The terminal subsystem aggregate
//!
//! One [`TerminalSubsystem`] is constructed at startup and shared by the
//! drain loops and the dispatcher. It owns the session table, the
//! readiness controller, and the per-device writers; nothing in the
//! process holds terminal state outside it.
//!
//! Lock order: the session table mutex is always taken and released
//! before any device slot lock. Every request resolves handle to device
//! first, then touches device state.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::TtyConfig;
use crate::device::{DeviceEndpoint, DeviceWriter};
use crate::dispatcher::run_dispatcher;
use crate::error::TtyError;
use crate::mux::DeviceMultiplexer;
use crate::readiness::ReadinessController;
use crate::session::SessionTable;
use crate::state::{DeviceId, Readiness, SessionHandle};
use crate::transport::{ReadReply, ReadyNotice, VfsRequest, WriteReply};

/// Owns all per-process terminal state: sessions, buffers, readiness,
/// and the device write halves.
pub struct TerminalSubsystem {
    config: TtyConfig,
    sessions: Mutex<SessionTable>,
    readiness: ReadinessController,
    writers: Vec<DeviceWriter>,
}

impl TerminalSubsystem {
    /// Build the aggregate. `writers` must hold one writer per device;
    /// they are stored in device-index order.
    pub fn new(
        config: TtyConfig,
        mut writers: Vec<DeviceWriter>,
        notify_tx: mpsc::Sender<ReadyNotice>,
    ) -> Self {
        assert_eq!(writers.len(), DeviceId::COUNT, "one writer per device");
        writers.sort_by_key(|w| w.device().index());

        let sessions = Mutex::new(SessionTable::new(&config));
        let readiness = ReadinessController::new(&config, notify_tx);

        Self {
            config,
            sessions,
            readiness,
            writers,
        }
    }

    /// Subsystem configuration.
    pub fn config(&self) -> &TtyConfig {
        &self.config
    }

    /// Readiness controller (drain loops push through this).
    pub fn controller(&self) -> &ReadinessController {
        &self.readiness
    }

    /// Write half for `device`.
    pub fn writer(&self, device: DeviceId) -> &DeviceWriter {
        &self.writers[device.index()]
    }

    fn sessions(&self) -> MutexGuard<'_, SessionTable> {
        match self.sessions.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Handle an open request: bind `handle` to the device `path` names.
    pub fn open_session(
        &self,
        pid: u32,
        handle: SessionHandle,
        path: &str,
    ) -> Result<DeviceId, TtyError> {
        self.sessions().open(path, pid, handle)
    }

    /// Handle a close request: release the session for `handle`.
    pub fn close_session(&self, handle: SessionHandle) -> Result<(), TtyError> {
        self.sessions().close(handle)
    }

    /// Handle a read request: one-shot poll of the buffer, never a wait.
    pub fn read_session(&self, handle: SessionHandle, size: usize) -> ReadReply {
        let device = match self.sessions().lookup(handle) {
            Some(device) => device,
            None => {
                warn!("read on unknown handle {handle}");
                return ReadReply {
                    data: Err(TtyError::NotFound(handle)),
                    readiness: Readiness::NONE,
                };
            }
        };

        match self.readiness.consume_read(device, size) {
            Ok(slice) => ReadReply {
                data: Ok(slice.data),
                readiness: slice.readiness,
            },
            Err(err) => ReadReply {
                data: Err(err),
                readiness: Readiness::NONE,
            },
        }
    }

    /// Handle a write request: pass the bytes straight through to the
    /// device. The `WRITE` bit is echoed back in every reply.
    pub async fn write_session(&self, handle: SessionHandle, bytes: &[u8]) -> WriteReply {
        let device = match self.sessions().lookup(handle) {
            Some(device) => device,
            None => {
                warn!("write on unknown handle {handle}");
                return WriteReply {
                    written: Err(TtyError::NotFound(handle)),
                    readiness: Readiness::WRITE,
                };
            }
        };

        match self.writer(device).write(bytes).await {
            Ok(count) => WriteReply {
                written: Ok(count),
                readiness: Readiness::WRITE,
            },
            Err(err) => {
                warn!("{device}: consumer write failed: {err}");
                WriteReply {
                    written: Err(TtyError::Hardware(err)),
                    readiness: Readiness::WRITE,
                }
            }
        }
    }

    /// Number of currently open sessions.
    pub fn session_count(&self) -> usize {
        self.sessions().len()
    }
}

impl std::fmt::Debug for TerminalSubsystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerminalSubsystem")
            .field("sessions", &self.session_count())
            .finish()
    }
}

/// Wire everything together: construct the subsystem from the opened
/// endpoints, spawn one drain loop per device plus the dispatcher, and
/// return the aggregate with the spawned task handles.
pub fn launch(
    config: TtyConfig,
    endpoints: Vec<DeviceEndpoint>,
    request_rx: mpsc::Receiver<VfsRequest>,
    notify_tx: mpsc::Sender<ReadyNotice>,
) -> (Arc<TerminalSubsystem>, Vec<JoinHandle<()>>) {
    let writers = endpoints.iter().map(|ep| ep.writer.clone()).collect();
    let subsystem = Arc::new(TerminalSubsystem::new(config, writers, notify_tx));

    for device in DeviceId::ALL {
        info!(
            "serving {} as {}",
            subsystem.config().line(device).device_path,
            subsystem.config().line(device).terminal_path
        );
    }

    let mut tasks = DeviceMultiplexer::new(Arc::clone(&subsystem), endpoints).spawn();
    tasks.push(tokio::spawn(run_dispatcher(
        Arc::clone(&subsystem),
        request_rx,
    )));

    (subsystem, tasks)
}
