//! Session registry
//!
//! Owns every live session. All mutation goes through the connection
//! task that owns the registry, so there is a single writer; lifecycle
//! events flow out through the shared event channel.

use std::collections::HashMap;

use gridshell_protocol::{CreateError, HostEvent, SessionId, SessionInfo};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::pty::{spawn_output_reader, PtyConfig, PtyHandle, ReaderHandle};

/// A live session: its metadata, PTY, and output reader
struct Session {
    info: SessionInfo,
    handle: PtyHandle,
    reader: ReaderHandle,
}

/// Registry of live sessions, bounded by a capacity limit
pub struct SessionRegistry {
    sessions: HashMap<SessionId, Session>,
    /// Monotonic label counter, never reused within a host lifetime
    next_serial: u64,
    capacity: usize,
    events: mpsc::UnboundedSender<HostEvent>,
}

impl SessionRegistry {
    pub fn new(capacity: usize, events: mpsc::UnboundedSender<HostEvent>) -> Self {
        Self {
            sessions: HashMap::new(),
            next_serial: 1,
            capacity,
            events,
        }
    }

    /// Create a new session running the user's login shell
    pub fn create(&mut self, cwd: Option<String>) -> Result<SessionInfo, CreateError> {
        let mut config = PtyConfig::login_shell();
        if let Some(dir) = &cwd {
            config = config.with_cwd(dir);
        }
        self.create_with(config, cwd)
    }

    /// Create a session from an explicit PTY config
    pub fn create_with(
        &mut self,
        config: PtyConfig,
        cwd: Option<String>,
    ) -> Result<SessionInfo, CreateError> {
        if self.sessions.len() >= self.capacity {
            debug!(capacity = self.capacity, "session capacity reached");
            return Err(CreateError::CapacityExceeded { max: self.capacity });
        }

        let (handle, reader) = PtyHandle::spawn(&config).map_err(|e| {
            warn!(error = %e, "failed to spawn session");
            CreateError::SpawnFailed {
                message: e.to_string(),
            }
        })?;

        let id = SessionId::generate();
        let serial = self.next_serial;
        self.next_serial += 1;

        let reader = spawn_output_reader(id, reader, self.events.clone());

        let (cols, rows) = config.size;
        let info = SessionInfo {
            id,
            serial,
            cwd,
            cols,
            rows,
        };

        info!(session = %id, serial, "session created");
        self.sessions.insert(
            id,
            Session {
                info: info.clone(),
                handle,
                reader,
            },
        );

        Ok(info)
    }

    /// Write input to a session's PTY
    ///
    /// Unknown ids are ignored; input can race with session exit.
    pub fn write(&self, id: SessionId, data: &[u8]) {
        match self.sessions.get(&id) {
            Some(session) => {
                if let Err(e) = session.handle.write_all(data) {
                    warn!(session = %id, error = %e, "write to session failed");
                }
            }
            None => debug!(session = %id, "write to unknown session dropped"),
        }
    }

    /// Resize a session's PTY
    ///
    /// Unknown ids are ignored, same as write.
    pub fn resize(&mut self, id: SessionId, cols: u16, rows: u16) {
        match self.sessions.get_mut(&id) {
            Some(session) => {
                if let Err(e) = session.handle.resize(cols, rows) {
                    warn!(session = %id, error = %e, "resize failed");
                    return;
                }
                session.info.cols = cols;
                session.info.rows = rows;
            }
            None => debug!(session = %id, "resize of unknown session dropped"),
        }
    }

    /// Destroy a session, killing its process
    ///
    /// Emits `Ended` for the session. Idempotent: destroying an unknown
    /// or already-removed id does nothing.
    pub fn destroy(&mut self, id: SessionId) -> bool {
        let Some(session) = self.sessions.remove(&id) else {
            debug!(session = %id, "destroy of unknown session ignored");
            return false;
        };

        session.reader.cancel();
        if let Err(e) = session.handle.kill() {
            debug!(session = %id, error = %e, "kill failed (already exited?)");
        }
        let exit_code = session.handle.wait().unwrap_or(-1);

        info!(session = %id, exit_code, "session destroyed");
        let _ = self.events.send(HostEvent::Ended { id, exit_code });
        true
    }

    /// Tear down every session without emitting events
    ///
    /// Used when the client disconnects; nobody is listening anymore.
    pub fn destroy_all(&mut self) {
        let count = self.sessions.len();
        for (id, session) in self.sessions.drain() {
            session.reader.cancel();
            let _ = session.handle.kill();
            let _ = session.handle.wait();
            debug!(session = %id, "session torn down");
        }
        if count > 0 {
            info!(count, "all sessions torn down");
        }
    }

    /// Reap sessions whose process exited on its own
    ///
    /// Emits `Ended` for each reaped session. Called periodically by
    /// the connection loop.
    pub fn poll_exits(&mut self) {
        let exited: Vec<(SessionId, i32)> = self
            .sessions
            .iter()
            .filter_map(|(id, session)| match session.handle.try_wait() {
                Ok(Some(code)) => Some((*id, code)),
                Ok(None) => None,
                Err(e) => {
                    warn!(session = %id, error = %e, "exit check failed");
                    None
                }
            })
            .collect();

        for (id, exit_code) in exited {
            if let Some(session) = self.sessions.remove(&id) {
                session.reader.cancel();
                info!(session = %id, exit_code, "session exited");
                let _ = self.events.send(HostEvent::Ended { id, exit_code });
            }
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn contains(&self, id: SessionId) -> bool {
        self.sessions.contains_key(&id)
    }

    #[cfg(test)]
    fn session_info(&self, id: SessionId) -> Option<&SessionInfo> {
        self.sessions.get(&id).map(|s| &s.info)
    }
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("sessions", &self.sessions.len())
            .field("capacity", &self.capacity)
            .field("next_serial", &self.next_serial)
            .finish()
    }
}
