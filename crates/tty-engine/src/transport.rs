//! Transport-facing request, reply, and notification types
//!
//! The virtual-filesystem transport that carries consumer requests is
//! external to this crate; its four handler entry points arrive here as
//! [`VfsRequest`] variants on an mpsc channel, each carrying a oneshot
//! reply sender. The single outbound call, ready notification, leaves as
//! a [`ReadyNotice`] stream. A request always produces exactly one reply,
//! even when the handle or path is invalid.

use tokio::sync::oneshot;

use crate::error::TtyError;
use crate::state::{DeviceId, Readiness, SessionHandle};

/// Reply to a read request: popped bytes or a failure, plus the read-side
/// readiness after the pop.
#[derive(Debug)]
pub struct ReadReply {
    /// Bytes popped from the buffer, or why none were
    pub data: Result<Vec<u8>, TtyError>,
    /// `READ` iff buffered data remains after this request
    pub readiness: Readiness,
}

/// Reply to a write request: accepted byte count or a failure. The
/// `WRITE` bit is present in every write reply.
#[derive(Debug)]
pub struct WriteReply {
    /// Byte count the device accepted, or why the write failed
    pub written: Result<usize, TtyError>,
    /// Always contains `WRITE`
    pub readiness: Readiness,
}

/// A consumer request delivered by the external transport.
#[derive(Debug)]
pub enum VfsRequest {
    /// Open a terminal path, binding `handle` to its device
    Open {
        /// Requesting process identity
        pid: u32,
        /// Handle the transport allocated for this open
        handle: SessionHandle,
        /// Terminal file path
        path: String,
        /// Reply channel
        reply: oneshot::Sender<Result<DeviceId, TtyError>>,
    },

    /// Close a previously opened handle
    Close {
        /// Handle to release
        handle: SessionHandle,
        /// Reply channel
        reply: oneshot::Sender<Result<(), TtyError>>,
    },

    /// Pop up to `size` buffered bytes; never waits for data
    Read {
        /// Handle to read from
        handle: SessionHandle,
        /// Maximum byte count to return
        size: usize,
        /// Reply channel
        reply: oneshot::Sender<ReadReply>,
    },

    /// Write bytes straight through to the device
    Write {
        /// Handle to write to
        handle: SessionHandle,
        /// Bytes to send
        bytes: Vec<u8>,
        /// Reply channel
        reply: oneshot::Sender<WriteReply>,
    },
}

/// Edge-triggered readiness notification, sent to whatever mounted the
/// device's terminal file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadyNotice {
    /// Terminal path the notice concerns
    pub path: String,
    /// Full readiness word at the time of the transition
    pub readiness: Readiness,
}
