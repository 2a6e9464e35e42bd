//! Simulated serial lines
//!
//! A [`VirtualSerialLine`] is the far end of an in-memory duplex pipe
//! standing in for a physical serial port. The near end goes to the
//! server as its device stream; tests and simulation mode hold the far
//! end to play the hardware's role:
//!
//! - [`VirtualSerialLine::feed`] injects bytes as if the line received
//!   them from the wire
//! - [`VirtualSerialLine::read_output`] and
//!   [`VirtualSerialLine::drain_output`] observe what the server wrote
//!   back (echo and consumer writes)
//!
//! # Example
//!
//! ```rust
//! use tty_sim::virtual_line;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let (device_side, mut line) = virtual_line(256);
//! // hand device_side to the server, then:
//! line.feed(b"hello").await.unwrap();
//! # drop(device_side);
//! # }
//! ```

use std::io;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};
use tokio::time::timeout;
use tracing::debug;

/// Create a simulated line with the given pipe capacity.
///
/// Returns the device-side stream (for the server) and the far end
/// (for the test or simulator driving the "hardware").
pub fn virtual_line(capacity: usize) -> (DuplexStream, VirtualSerialLine) {
    let (device_side, far_side) = tokio::io::duplex(capacity);
    (device_side, VirtualSerialLine { io: far_side })
}

/// The hardware's end of a simulated serial line.
pub struct VirtualSerialLine {
    io: DuplexStream,
}

impl VirtualSerialLine {
    /// Put `bytes` on the wire toward the server.
    pub async fn feed(&mut self, bytes: &[u8]) -> io::Result<()> {
        debug!("line feed: {:02X?}", &bytes[..bytes.len().min(32)]);
        self.io.write_all(bytes).await?;
        self.io.flush().await
    }

    /// Read exactly `len` bytes of server output, or fail after `wait`.
    pub async fn read_output(&mut self, len: usize, wait: Duration) -> io::Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        match timeout(wait, self.io.read_exact(&mut buf)).await {
            Ok(result) => {
                result?;
                Ok(buf)
            }
            Err(_) => Err(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("expected {len} bytes of line output within {wait:?}"),
            )),
        }
    }

    /// Collect whatever the server writes until the line stays quiet for
    /// `quiet`. Returns the accumulated bytes (possibly empty).
    pub async fn drain_output(&mut self, quiet: Duration) -> Vec<u8> {
        let mut collected = Vec::new();
        let mut buf = [0u8; 256];

        loop {
            match timeout(quiet, self.io.read(&mut buf)).await {
                Ok(Ok(n)) if n > 0 => collected.extend_from_slice(&buf[..n]),
                // Quiet period elapsed, the pipe closed, or a read error:
                // whatever arrived is the answer
                _ => return collected,
            }
        }
    }
}
