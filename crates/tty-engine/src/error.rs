//! Error types for the terminal subsystem

use thiserror::Error;

use crate::state::SessionHandle;

/// Errors surfaced by terminal subsystem operations.
///
/// None of these are fatal: the drain loops and the dispatcher keep
/// running, and every variant other than [`TtyError::Transport`] is
/// reported to the requesting consumer as a failure reply.
#[derive(Debug, Error)]
pub enum TtyError {
    /// Open named a path that maps to no device
    #[error("unrecognized terminal path: {0}")]
    InvalidPath(String),

    /// Operation on an unknown or already-closed handle
    #[error("no session for handle {0}")]
    NotFound(SessionHandle),

    /// Session allocation failed
    #[error("session table full ({0} sessions)")]
    ResourceExhausted(usize),

    /// Read against an empty buffer
    #[error("no buffered data available")]
    NoDataAvailable,

    /// Device read/write failure
    #[error("device I/O error: {0}")]
    Hardware(#[from] std::io::Error),

    /// Notification or reply could not be delivered
    #[error("transport send failed: {0}")]
    Transport(String),
}
