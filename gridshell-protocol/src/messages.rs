//! Client-host message catalog

use serde::{Deserialize, Serialize};

use crate::types::{CreateError, SessionId, SessionInfo};

/// Requests sent from the client to the host
///
/// All requests are fire-and-forget: their effects are observed through
/// later [`HostEvent`]s, never through a blocking reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ClientRequest {
    /// Create a new shell session
    Create {
        /// Working directory for the shell (host falls back to $HOME)
        cwd: Option<String>,
    },

    /// Send input bytes to a session's shell
    ///
    /// Silently ignored by the host if the session no longer exists;
    /// the session may have exited after the client's last snapshot.
    Write { id: SessionId, data: Vec<u8> },

    /// Propagate a terminal geometry change to a session's PTY
    Resize {
        id: SessionId,
        cols: u16,
        rows: u16,
    },

    /// Terminate a session. Idempotent: unknown ids are ignored.
    Destroy { id: SessionId },

    /// Tear down every session and stop the host
    Shutdown,
}

/// Events sent from the host to the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HostEvent {
    /// A create request succeeded and the session is streaming
    Created { session: SessionInfo },

    /// A create request was refused; no session was registered
    CreateFailed { error: CreateError },

    /// Output bytes produced by a session's shell
    ///
    /// Per-session byte order is preserved; interleaving across
    /// sessions is unspecified.
    Output { id: SessionId, data: Vec<u8> },

    /// A session's shell process exited, whether from a destroy request
    /// or on its own (e.g. the user typed `exit`)
    Ended { id: SessionId, exit_code: i32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_equality() {
        let id = SessionId::generate();
        let a = ClientRequest::Write {
            id,
            data: b"ls\r".to_vec(),
        };
        let b = ClientRequest::Write {
            id,
            data: b"ls\r".to_vec(),
        };
        assert_eq!(a, b);
    }

    #[test]
    fn test_event_carries_exit_code() {
        let ev = HostEvent::Ended {
            id: SessionId::generate(),
            exit_code: 130,
        };
        match ev {
            HostEvent::Ended { exit_code, .. } => assert_eq!(exit_code, 130),
            _ => unreachable!(),
        }
    }
}
