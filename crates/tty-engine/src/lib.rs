//! Terminal line-discipline engine
//!
//! This crate is the core of the ttyline server: it turns unbuffered
//! serial device I/O into a flow-controlled, buffered character stream
//! for consumers that open terminal files through a virtual-filesystem
//! transport.
//!
//! # Architecture
//!
//! Three independently timed actors meet in per-device state:
//!
//! - The **drain loops** ([`mux`]) pull bytes from the raw device files,
//!   echo control characters in caret notation back to the line, and push
//!   the batch into that device's ring buffer.
//! - The **dispatcher** ([`dispatcher`]) services open/close/read/write
//!   requests from consumers, resolving handles through the session table
//!   and popping buffered data. Reads are one-shot polls: a request
//!   resolves immediately against current contents and never waits.
//! - The **readiness controller** ([`readiness`]) keeps the two honest:
//!   one mutex per device guards the buffer and the readiness bitmask, and
//!   edge-triggered notices tell consumers when a drained line first has
//!   data again.
//!
//! Writes bypass the buffers entirely: they pass straight through to the
//! device, so write readiness is statically true.
//!
//! # Example
//!
//! ```rust,no_run
//! use tokio::sync::{mpsc, oneshot};
//! use tty_engine::{launch, DeviceEndpoint, DeviceId, SessionHandle, TtyConfig, VfsRequest};
//!
//! # async fn wiring() {
//! let config = TtyConfig::default();
//! let endpoints = vec![
//!     DeviceEndpoint::open_serial(DeviceId::Serial1, "/serial1", 115_200).unwrap(),
//!     DeviceEndpoint::open_serial(DeviceId::Serial2, "/serial2", 115_200).unwrap(),
//! ];
//!
//! let (request_tx, request_rx) = mpsc::channel(256);
//! let (notify_tx, _notify_rx) = mpsc::channel(config.notify_queue_depth);
//! let (_subsystem, _tasks) = launch(config, endpoints, request_rx, notify_tx);
//!
//! // The transport glue forwards consumer requests:
//! let (reply_tx, reply_rx) = oneshot::channel();
//! request_tx
//!     .send(VfsRequest::Open {
//!         pid: 42,
//!         handle: SessionHandle(1),
//!         path: "/ttyS1".to_string(),
//!         reply: reply_tx,
//!     })
//!     .await
//!     .unwrap();
//! let _device = reply_rx.await.unwrap();
//! # }
//! ```

pub mod config;
pub mod device;
pub mod dispatcher;
pub mod error;
pub mod mux;
pub mod readiness;
pub mod session;
pub mod state;
pub mod subsystem;
pub mod transport;

pub use config::{LineConfig, TtyConfig};
pub use device::{DeviceEndpoint, DeviceReader, DeviceWriter};
pub use dispatcher::run_dispatcher;
pub use error::TtyError;
pub use mux::DeviceMultiplexer;
pub use readiness::{ReadSlice, ReadinessController};
pub use session::{Session, SessionTable};
pub use state::{DeviceId, Readiness, SessionHandle};
pub use subsystem::{launch, TerminalSubsystem};
pub use transport::{ReadReply, ReadyNotice, VfsRequest, WriteReply};
