//! Session table
//!
//! Maps opaque consumer handles to physical devices. The table owns every
//! session record exclusively: a record is created on a successful open,
//! found by handle on each read/write/close, and dropped on close. No
//! other component keeps a reference across a close.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::config::TtyConfig;
use crate::error::TtyError;
use crate::state::{DeviceId, SessionHandle};

/// One consumer's open handle on a device.
#[derive(Debug, Clone)]
pub struct Session {
    /// Line this handle reads and writes
    pub device: DeviceId,
    /// Requesting process identity
    pub pid: u32,
}

/// Keyed collection of open sessions plus the path-to-device routes.
#[derive(Debug)]
pub struct SessionTable {
    sessions: HashMap<SessionHandle, Session>,
    routes: Vec<(String, DeviceId)>,
    max_sessions: usize,
}

impl SessionTable {
    /// Build an empty table routing the configured terminal paths.
    pub fn new(config: &TtyConfig) -> Self {
        let routes = DeviceId::ALL
            .into_iter()
            .map(|dev| (config.line(dev).terminal_path.clone(), dev))
            .collect();

        Self {
            sessions: HashMap::new(),
            routes,
            max_sessions: config.max_sessions,
        }
    }

    /// Map a terminal path to its device, if the path is recognized.
    pub fn resolve_path(&self, path: &str) -> Option<DeviceId> {
        self.routes
            .iter()
            .find(|(route, _)| route == path)
            .map(|&(_, dev)| dev)
    }

    /// Create a session for `handle` on the device `path` names.
    pub fn open(
        &mut self,
        path: &str,
        pid: u32,
        handle: SessionHandle,
    ) -> Result<DeviceId, TtyError> {
        let device = self
            .resolve_path(path)
            .ok_or_else(|| TtyError::InvalidPath(path.to_string()))?;

        if self.sessions.len() >= self.max_sessions && !self.sessions.contains_key(&handle) {
            return Err(TtyError::ResourceExhausted(self.max_sessions));
        }

        if self
            .sessions
            .insert(handle, Session { device, pid })
            .is_some()
        {
            warn!("handle {handle} reopened before close, replacing stale session");
        }

        debug!("session opened: handle={handle} pid={pid} device={device}");
        Ok(device)
    }

    /// Device for an open handle; `None` for unknown or closed handles.
    pub fn lookup(&self, handle: SessionHandle) -> Option<DeviceId> {
        self.sessions.get(&handle).map(|s| s.device)
    }

    /// Remove and release the session for `handle`.
    pub fn close(&mut self, handle: SessionHandle) -> Result<(), TtyError> {
        match self.sessions.remove(&handle) {
            Some(session) => {
                debug!(
                    "session closed: handle={handle} pid={} device={}",
                    session.pid, session.device
                );
                Ok(())
            }
            None => Err(TtyError::NotFound(handle)),
        }
    }

    /// Number of open sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// `true` if no session is open.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> SessionTable {
        SessionTable::new(&TtyConfig::default())
    }

    #[test]
    fn open_routes_known_paths() {
        let mut t = table();
        let dev = t.open("/ttyS1", 10, SessionHandle(1)).unwrap();
        assert_eq!(dev, DeviceId::Serial1);
        let dev = t.open("/ttyS2", 10, SessionHandle(2)).unwrap();
        assert_eq!(dev, DeviceId::Serial2);
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn open_rejects_unknown_path() {
        let mut t = table();
        let err = t.open("/ttyS9", 10, SessionHandle(1)).unwrap_err();
        assert!(matches!(err, TtyError::InvalidPath(_)));
        assert!(t.is_empty());
    }

    #[test]
    fn lookup_follows_session_lifetime() {
        let mut t = table();
        let handle = SessionHandle(7);
        assert_eq!(t.lookup(handle), None);

        t.open("/ttyS1", 10, handle).unwrap();
        assert_eq!(t.lookup(handle), Some(DeviceId::Serial1));

        t.close(handle).unwrap();
        assert_eq!(t.lookup(handle), None);
    }

    #[test]
    fn double_close_reports_not_found() {
        let mut t = table();
        let handle = SessionHandle(3);
        t.open("/ttyS2", 10, handle).unwrap();

        assert!(t.close(handle).is_ok());
        let err = t.close(handle).unwrap_err();
        assert!(matches!(err, TtyError::NotFound(h) if h == handle));
    }

    #[test]
    fn session_limit_is_enforced() {
        let config = TtyConfig {
            max_sessions: 2,
            ..TtyConfig::default()
        };
        let mut t = SessionTable::new(&config);

        t.open("/ttyS1", 10, SessionHandle(1)).unwrap();
        t.open("/ttyS1", 11, SessionHandle(2)).unwrap();

        let err = t.open("/ttyS2", 12, SessionHandle(3)).unwrap_err();
        assert!(matches!(err, TtyError::ResourceExhausted(2)));

        // Closing frees a slot
        t.close(SessionHandle(1)).unwrap();
        assert!(t.open("/ttyS2", 12, SessionHandle(3)).is_ok());
    }

    #[test]
    fn reopened_handle_replaces_stale_session() {
        let mut t = table();
        let handle = SessionHandle(5);
        t.open("/ttyS1", 10, handle).unwrap();
        t.open("/ttyS2", 10, handle).unwrap();

        assert_eq!(t.len(), 1);
        assert_eq!(t.lookup(handle), Some(DeviceId::Serial2));
    }
}
