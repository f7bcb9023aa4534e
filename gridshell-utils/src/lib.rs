//! gridshell-utils: shared infrastructure for gridshell crates
//!
//! Error types, logging setup, and filesystem path conventions used by
//! the host daemon and the TUI client.

pub mod error;
pub mod logging;
pub mod paths;

pub use error::{GridshellError, Result};
pub use logging::{init_logging, LogConfig};
pub use paths::{config_file, ensure_dir, log_dir, runtime_dir, socket_path};
