//! gridshell-protocol: shared IPC definitions for gridshell
//!
//! The routing channel between the host daemon and the TUI client is a
//! stream of length-prefixed bincode messages. Requests flow client to
//! host ([`ClientRequest`]), events flow host to client ([`HostEvent`]).
//! Both sides match the catalog exhaustively, so adding a message kind
//! is a compile-time-checked change.

pub mod codec;
pub mod messages;
pub mod types;

pub use codec::{ClientCodec, CodecError, HostCodec};
pub use messages::{ClientRequest, HostEvent};
pub use types::{CreateError, SessionId, SessionInfo};

/// Default PTY size at session creation (cols, rows)
pub const DEFAULT_PTY_SIZE: (u16, u16) = (80, 24);

/// Default maximum number of concurrent sessions
pub const DEFAULT_MAX_SESSIONS: usize = 9;
