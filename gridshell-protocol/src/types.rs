//! Session types shared between host and client

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque identifier for a shell session
///
/// Allocated only by the host-side registry, never by the client, so id
/// collisions are structurally impossible. An id is never reused within
/// the lifetime of the host process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Mint a fresh session id (registry use only)
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Descriptor for a live session, sent in `HostEvent::Created`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionInfo {
    /// Session id
    pub id: SessionId,
    /// Monotonic creation counter, used for tab order and labels
    pub serial: u64,
    /// Working directory the shell was started in
    pub cwd: Option<String>,
    /// Initial terminal width in character cells
    pub cols: u16,
    /// Initial terminal height in character cells
    pub rows: u16,
}

/// Why a create request was refused
///
/// Carried in `HostEvent::CreateFailed`. In both cases no session was
/// registered on the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
pub enum CreateError {
    #[error("session limit reached ({max} sessions)")]
    CapacityExceeded { max: usize },

    #[error("failed to spawn shell: {message}")]
    SpawnFailed { message: String },
}
