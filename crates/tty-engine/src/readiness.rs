//! Per-device readiness state machine
//!
//! Each device pairs its inbound ring buffer with a readiness bitmask
//! behind one mutex, so "observe the buffer, mutate it, update readiness,
//! decide to notify" is a single atomic unit. Two contexts contend for
//! it: the drain loop pushing hardware bytes in, and the dispatcher
//! popping bytes out for consumers.
//!
//! Notifications are edge-triggered: a notice fires only when a device
//! transitions to read-ready, never again while it stays ready. The
//! notice value is captured under the lock but sent after unlock through
//! a bounded channel, so a slow notice consumer can never stall the
//! hardware drain.

use std::sync::{Mutex, MutexGuard};

use tokio::sync::mpsc;
use tracing::{debug, warn};

use tty_buffer::RingBuffer;

use crate::config::TtyConfig;
use crate::error::TtyError;
use crate::state::{DeviceId, Readiness};
use crate::transport::ReadyNotice;

/// Result of a successful `consume_read`: the popped bytes and the
/// read-side readiness left behind.
#[derive(Debug)]
pub struct ReadSlice {
    /// Bytes popped, FIFO order
    pub data: Vec<u8>,
    /// `READ` iff the buffer still holds data
    pub readiness: Readiness,
}

struct SlotState {
    buffer: RingBuffer,
    ready: Readiness,
}

struct DeviceSlot {
    path: String,
    state: Mutex<SlotState>,
}

impl DeviceSlot {
    fn lock(&self) -> MutexGuard<'_, SlotState> {
        // A poisoned slot only means another thread panicked mid-section;
        // the buffer and bitmask are still structurally valid, and the
        // steady-state loops must not exit.
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Tracks read/write readiness per device and emits edge-triggered
/// notices to the transport.
pub struct ReadinessController {
    slots: Vec<DeviceSlot>,
    notify_tx: mpsc::Sender<ReadyNotice>,
}

impl ReadinessController {
    /// Build one slot per device with its configured buffer capacity.
    /// `WRITE` starts set and stays set: writes are synchronous
    /// pass-through and never queued.
    pub fn new(config: &TtyConfig, notify_tx: mpsc::Sender<ReadyNotice>) -> Self {
        let slots = DeviceId::ALL
            .into_iter()
            .map(|dev| {
                let line = config.line(dev);
                DeviceSlot {
                    path: line.terminal_path.clone(),
                    state: Mutex::new(SlotState {
                        buffer: RingBuffer::new(line.read_buffer_bytes),
                        ready: Readiness::WRITE,
                    }),
                }
            })
            .collect();

        Self { slots, notify_tx }
    }

    fn slot(&self, device: DeviceId) -> &DeviceSlot {
        &self.slots[device.index()]
    }

    /// Buffer a drained batch from the hardware, raising the read-ready
    /// edge at most once per batch. Returns the byte count accepted;
    /// overflow is dropped and logged, per the backpressure policy.
    pub fn ingest(&self, device: DeviceId, bytes: &[u8]) -> usize {
        let slot = self.slot(device);

        let (accepted, notice) = {
            let mut state = slot.lock();
            let accepted = state.buffer.push_slice(bytes);

            let notice = if accepted > 0 && !state.ready.contains(Readiness::READ) {
                state.ready.insert(Readiness::READ);
                Some(ReadyNotice {
                    path: slot.path.clone(),
                    readiness: state.ready,
                })
            } else {
                None
            };
            (accepted, notice)
        };

        if accepted < bytes.len() {
            warn!(
                "{device}: input buffer full, dropped {} of {} bytes",
                bytes.len() - accepted,
                bytes.len()
            );
        }

        if let Some(notice) = notice {
            self.send_notice(notice);
        }

        accepted
    }

    /// Pop up to `max` bytes for a consumer read. Resolves immediately
    /// against current contents; an empty buffer is `NoDataAvailable`,
    /// never a wait.
    pub fn consume_read(&self, device: DeviceId, max: usize) -> Result<ReadSlice, TtyError> {
        let mut state = self.slot(device).lock();

        let data = state.buffer.pop_chunk(max);
        if data.is_empty() {
            state.ready.remove(Readiness::READ);
            return Err(TtyError::NoDataAvailable);
        }

        let readiness = if state.buffer.is_empty() {
            state.ready.remove(Readiness::READ);
            Readiness::NONE
        } else {
            state.ready.insert(Readiness::READ);
            Readiness::READ
        };

        debug!(
            "{device}: popped {} bytes, {} remain",
            data.len(),
            state.buffer.len()
        );

        Ok(ReadSlice { data, readiness })
    }

    /// Current readiness word for `device`.
    pub fn readiness(&self, device: DeviceId) -> Readiness {
        self.slot(device).lock().ready
    }

    /// Bytes currently buffered for `device`.
    pub fn buffered(&self, device: DeviceId) -> usize {
        self.slot(device).lock().buffer.len()
    }

    fn send_notice(&self, notice: ReadyNotice) {
        debug!("ready notice: {} {}", notice.path, notice.readiness);
        if let Err(err) = self.notify_tx.try_send(notice) {
            // Logged and dropped: the next edge, if any, retries naturally.
            warn!("ready notice not delivered: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller_with_capacity(
        cap: usize,
    ) -> (ReadinessController, mpsc::Receiver<ReadyNotice>) {
        let mut config = TtyConfig::default();
        config.serial1.read_buffer_bytes = cap;
        config.serial2.read_buffer_bytes = cap;
        let (tx, rx) = mpsc::channel(8);
        (ReadinessController::new(&config, tx), rx)
    }

    #[test]
    fn write_ready_is_set_from_the_start() {
        let (ctrl, _rx) = controller_with_capacity(16);
        for dev in DeviceId::ALL {
            assert!(ctrl.readiness(dev).contains(Readiness::WRITE));
            assert!(!ctrl.readiness(dev).contains(Readiness::READ));
        }
    }

    #[test]
    fn first_arrival_raises_exactly_one_edge() {
        let (ctrl, mut rx) = controller_with_capacity(16);

        assert_eq!(ctrl.ingest(DeviceId::Serial1, b"abc"), 3);
        let notice = rx.try_recv().unwrap();
        assert_eq!(notice.path, "/ttyS1");
        assert!(notice.readiness.contains(Readiness::READ | Readiness::WRITE));

        // Further arrivals while still ready are silent
        ctrl.ingest(DeviceId::Serial1, b"de");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn edge_rearms_after_full_drain() {
        let (ctrl, mut rx) = controller_with_capacity(16);

        ctrl.ingest(DeviceId::Serial1, b"abc");
        rx.try_recv().unwrap();

        let slice = ctrl.consume_read(DeviceId::Serial1, 10).unwrap();
        assert_eq!(slice.data, b"abc");
        assert_eq!(slice.readiness, Readiness::NONE);

        ctrl.ingest(DeviceId::Serial1, b"x");
        let notice = rx.try_recv().unwrap();
        assert!(notice.readiness.contains(Readiness::READ));
    }

    #[test]
    fn partial_drain_keeps_read_ready_set() {
        let (ctrl, mut rx) = controller_with_capacity(16);

        ctrl.ingest(DeviceId::Serial1, b"abcde");
        rx.try_recv().unwrap();

        let slice = ctrl.consume_read(DeviceId::Serial1, 3).unwrap();
        assert_eq!(slice.data, b"abc");
        assert_eq!(slice.readiness, Readiness::READ);

        // No new edge while data remains
        ctrl.ingest(DeviceId::Serial1, b"f");
        assert!(rx.try_recv().is_err());

        let slice = ctrl.consume_read(DeviceId::Serial1, 10).unwrap();
        assert_eq!(slice.data, b"def");
        assert_eq!(slice.readiness, Readiness::NONE);
    }

    #[test]
    fn empty_read_is_no_data_available() {
        let (ctrl, _rx) = controller_with_capacity(16);

        let err = ctrl.consume_read(DeviceId::Serial2, 4).unwrap_err();
        assert!(matches!(err, TtyError::NoDataAvailable));
        assert!(!ctrl.readiness(DeviceId::Serial2).contains(Readiness::READ));
    }

    #[test]
    fn overflow_drops_excess_without_corruption() {
        let (ctrl, _rx) = controller_with_capacity(4);

        assert_eq!(ctrl.ingest(DeviceId::Serial1, b"abcdef"), 4);
        assert_eq!(ctrl.buffered(DeviceId::Serial1), 4);

        let slice = ctrl.consume_read(DeviceId::Serial1, 10).unwrap();
        assert_eq!(slice.data, b"abcd");
    }

    #[test]
    fn devices_are_independent() {
        let (ctrl, mut rx) = controller_with_capacity(16);

        ctrl.ingest(DeviceId::Serial1, b"one");
        ctrl.ingest(DeviceId::Serial2, b"two");

        assert_eq!(rx.try_recv().unwrap().path, "/ttyS1");
        assert_eq!(rx.try_recv().unwrap().path, "/ttyS2");

        assert_eq!(ctrl.consume_read(DeviceId::Serial2, 8).unwrap().data, b"two");
        assert_eq!(ctrl.consume_read(DeviceId::Serial1, 8).unwrap().data, b"one");
    }

    #[test]
    fn dropped_notice_does_not_stall_ingest() {
        let mut config = TtyConfig::default();
        config.serial1.read_buffer_bytes = 16;
        let (tx, rx) = mpsc::channel(1);
        let ctrl = ReadinessController::new(&config, tx);

        // Fill the notice queue, then force a second edge
        ctrl.ingest(DeviceId::Serial1, b"a");
        ctrl.consume_read(DeviceId::Serial1, 1).unwrap();
        ctrl.ingest(DeviceId::Serial1, b"b");
        ctrl.consume_read(DeviceId::Serial1, 1).unwrap();
        ctrl.ingest(DeviceId::Serial1, b"c");

        // Still made progress despite the queue being full
        assert_eq!(ctrl.buffered(DeviceId::Serial1), 1);
        drop(rx);
    }
}
