//! Device identifiers, session handles, and the readiness bitmask

use std::fmt;
use std::ops::{BitAnd, BitOr};

/// Identifies one of the two physical serial lines.
///
/// The set is fixed for the process lifetime: devices are opened at
/// startup and only destroyed at teardown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceId {
    /// First serial port
    Serial1,
    /// Second serial port
    Serial2,
}

impl DeviceId {
    /// Every device, in index order.
    pub const ALL: [DeviceId; 2] = [DeviceId::Serial1, DeviceId::Serial2];

    /// Number of devices.
    pub const COUNT: usize = 2;

    /// Dense index for per-device tables.
    pub fn index(self) -> usize {
        match self {
            DeviceId::Serial1 => 0,
            DeviceId::Serial2 => 1,
        }
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceId::Serial1 => write!(f, "serial1"),
            DeviceId::Serial2 => write!(f, "serial2"),
        }
    }
}

/// Opaque per-open identifier issued by the external transport.
///
/// Distinct from [`DeviceId`]: many handles may refer to the same line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionHandle(pub u32);

impl fmt::Display for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-device readiness bitmask carried in replies and notices.
///
/// `READ` tracks whether the inbound ring buffer held data at last
/// observation. `WRITE` is statically true for a device's lifetime:
/// writes pass straight through to the hardware and are never queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Readiness(u8);

impl Readiness {
    /// No bits set.
    pub const NONE: Readiness = Readiness(0);
    /// Buffered data is available to read.
    pub const READ: Readiness = Readiness(0b01);
    /// The device accepts a write attempt.
    pub const WRITE: Readiness = Readiness(0b10);

    /// Raw bit value.
    pub fn bits(self) -> u8 {
        self.0
    }

    /// `true` if every bit in `other` is set in `self`.
    pub fn contains(self, other: Readiness) -> bool {
        self.0 & other.0 == other.0
    }

    /// Set the bits in `other`.
    pub fn insert(&mut self, other: Readiness) {
        self.0 |= other.0;
    }

    /// Clear the bits in `other`.
    pub fn remove(&mut self, other: Readiness) {
        self.0 &= !other.0;
    }

    /// `true` if no bit is set.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for Readiness {
    type Output = Readiness;

    fn bitor(self, rhs: Readiness) -> Readiness {
        Readiness(self.0 | rhs.0)
    }
}

impl BitAnd for Readiness {
    type Output = Readiness;

    fn bitand(self, rhs: Readiness) -> Readiness {
        Readiness(self.0 & rhs.0)
    }
}

impl fmt::Display for Readiness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "-");
        }
        let mut first = true;
        for (bit, name) in [(Readiness::READ, "READ"), (Readiness::WRITE, "WRITE")] {
            if self.contains(bit) {
                if !first {
                    write!(f, "|")?;
                }
                write!(f, "{name}")?;
                first = false;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_indices_are_dense() {
        for (expected, dev) in DeviceId::ALL.into_iter().enumerate() {
            assert_eq!(dev.index(), expected);
        }
    }

    #[test]
    fn readiness_bit_operations() {
        let mut r = Readiness::NONE;
        assert!(r.is_empty());

        r.insert(Readiness::WRITE);
        assert!(r.contains(Readiness::WRITE));
        assert!(!r.contains(Readiness::READ));

        r.insert(Readiness::READ);
        assert!(r.contains(Readiness::READ | Readiness::WRITE));

        r.remove(Readiness::READ);
        assert_eq!(r, Readiness::WRITE);
        assert_eq!(r & Readiness::READ, Readiness::NONE);
    }

    #[test]
    fn readiness_display() {
        assert_eq!(Readiness::NONE.to_string(), "-");
        assert_eq!(Readiness::READ.to_string(), "READ");
        assert_eq!((Readiness::READ | Readiness::WRITE).to_string(), "READ|WRITE");
    }
}
