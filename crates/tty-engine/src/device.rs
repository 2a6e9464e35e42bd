//! Device file plumbing
//!
//! Each physical line is opened once at startup and split into a read
//! half, owned by that device's drain loop, and a shared [`DeviceWriter`]
//! used by both the echo path and consumer writes. Real hardware comes in
//! through `tokio_serial`; tests and simulation mode substitute any
//! `AsyncRead + AsyncWrite` stream (a duplex pipe, typically).

use std::io;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;
use tokio_serial::SerialPortBuilderExt;

use crate::state::DeviceId;

/// Boxed read half of a device stream.
pub type DeviceReader = Box<dyn AsyncRead + Send + Unpin>;

type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Cloneable handle to a device's write half.
///
/// Echo writes (from the drain loop) and consumer writes (from the
/// dispatcher) serialize on the inner async mutex; neither ever holds a
/// device's readiness lock while writing.
#[derive(Clone)]
pub struct DeviceWriter {
    device: DeviceId,
    inner: Arc<Mutex<BoxedWriter>>,
}

impl DeviceWriter {
    /// Wrap a write half for `device`.
    pub fn new(device: DeviceId, writer: impl AsyncWrite + Send + Unpin + 'static) -> Self {
        Self {
            device,
            inner: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    /// Device this writer belongs to.
    pub fn device(&self) -> DeviceId {
        self.device
    }

    /// Write `bytes` to the device and report the count accepted.
    pub async fn write(&self, bytes: &[u8]) -> io::Result<usize> {
        let mut writer = self.inner.lock().await;
        writer.write_all(bytes).await?;
        writer.flush().await?;
        Ok(bytes.len())
    }
}

impl std::fmt::Debug for DeviceWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceWriter")
            .field("device", &self.device)
            .finish()
    }
}

/// A device's split I/O: the drain loop takes the reader, everything else
/// shares the writer.
pub struct DeviceEndpoint {
    /// Which line this endpoint is
    pub device: DeviceId,
    /// Read half, consumed by the drain loop
    pub reader: DeviceReader,
    /// Shared write half
    pub writer: DeviceWriter,
}

impl DeviceEndpoint {
    /// Build an endpoint from any bidirectional stream.
    pub fn from_stream<T>(device: DeviceId, io: T) -> Self
    where
        T: AsyncRead + AsyncWrite + Send + Unpin + 'static,
    {
        let (reader, writer) = tokio::io::split(io);
        Self {
            device,
            reader: Box::new(reader),
            writer: DeviceWriter::new(device, writer),
        }
    }

    /// Open the real serial port behind `path`.
    pub fn open_serial(
        device: DeviceId,
        path: &str,
        baud_rate: u32,
    ) -> Result<Self, tokio_serial::Error> {
        let stream = tokio_serial::new(path, baud_rate)
            .timeout(Duration::from_millis(100))
            .open_native_async()?;

        Ok(Self::from_stream(device, stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn writer_reports_accepted_count() {
        let (ours, mut theirs) = tokio::io::duplex(64);
        let endpoint = DeviceEndpoint::from_stream(DeviceId::Serial1, ours);

        let n = endpoint.writer.write(b"hello").await.unwrap();
        assert_eq!(n, 5);

        let mut buf = [0u8; 5];
        theirs.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"hello");
    }

    #[tokio::test]
    async fn cloned_writers_share_the_line() {
        let (ours, mut theirs) = tokio::io::duplex(64);
        let endpoint = DeviceEndpoint::from_stream(DeviceId::Serial2, ours);

        let a = endpoint.writer.clone();
        let b = endpoint.writer.clone();
        a.write(b"ab").await.unwrap();
        b.write(b"cd").await.unwrap();

        let mut buf = [0u8; 4];
        theirs.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"abcd");
    }
}
