//! Byte-level primitives for the ttyline terminal server
//!
//! This crate provides the two pure building blocks the line-discipline
//! engine is assembled from:
//!
//! - **RingBuffer**: a fixed-capacity byte FIFO with a drop-on-overflow
//!   policy, one per physical serial line
//! - **echo**: transcoding of C0 control bytes into visible caret notation
//!   for local echo
//!
//! Neither type performs I/O or synchronization; callers serialize access
//! and decide where the produced bytes go.
//!
//! # Example
//!
//! ```rust
//! use tty_buffer::{echo, RingBuffer};
//!
//! let mut buf = RingBuffer::new(8);
//! assert_eq!(buf.push_slice(b"hi"), 2);
//! assert_eq!(buf.pop_chunk(8), b"hi");
//!
//! // Ctrl-A echoes as ^A, printable bytes echo as themselves
//! assert_eq!(echo::transcode(&[0x01, b'x']), b"^Ax");
//! ```

pub mod echo;
pub mod ring;

pub use ring::RingBuffer;
