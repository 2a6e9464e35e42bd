//! Request dispatcher
//!
//! The single execution context that services consumer requests arriving
//! from the external transport. Each request maps onto one subsystem
//! operation and produces exactly one reply, including for invalid paths
//! and stale handles; a request is never silently dropped.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::subsystem::TerminalSubsystem;
use crate::transport::VfsRequest;

/// Service requests until the transport side closes the channel.
pub async fn run_dispatcher(
    subsystem: Arc<TerminalSubsystem>,
    mut request_rx: mpsc::Receiver<VfsRequest>,
) {
    info!("request dispatcher started");

    while let Some(request) = request_rx.recv().await {
        match request {
            VfsRequest::Open {
                pid,
                handle,
                path,
                reply,
            } => {
                let result = subsystem.open_session(pid, handle, &path);
                if let Err(err) = &result {
                    warn!("open {path} for pid {pid} failed: {err}");
                }
                send_reply(reply, result, "open");
            }

            VfsRequest::Close { handle, reply } => {
                let result = subsystem.close_session(handle);
                if let Err(err) = &result {
                    warn!("close of handle {handle} failed: {err}");
                }
                send_reply(reply, result, "close");
            }

            VfsRequest::Read {
                handle,
                size,
                reply,
            } => {
                let outcome = subsystem.read_session(handle, size);
                debug!(
                    "read handle={handle} size={size} -> {:?} ready={}",
                    outcome.data.as_ref().map(Vec::len),
                    outcome.readiness
                );
                send_reply(reply, outcome, "read");
            }

            VfsRequest::Write {
                handle,
                bytes,
                reply,
            } => {
                let outcome = subsystem.write_session(handle, &bytes).await;
                debug!(
                    "write handle={handle} size={} -> {:?}",
                    bytes.len(),
                    outcome.written
                );
                send_reply(reply, outcome, "write");
            }
        }
    }

    info!("request dispatcher stopped");
}

fn send_reply<T>(reply: oneshot::Sender<T>, value: T, kind: &str) {
    if reply.send(value).is_err() {
        warn!("{kind} reply dropped: requester went away");
    }
}
