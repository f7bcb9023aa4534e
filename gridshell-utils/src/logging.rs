//! Logging infrastructure for gridshell
//!
//! Provides unified logging setup using the tracing ecosystem. Both
//! binaries log to a file under the XDG state directory because the
//! client owns the terminal and the host runs detached.

use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::{paths, GridshellError, Result};

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Log file name under the log directory
    pub file_name: String,
    /// Log level filter (e.g., "info", "gridshell=debug,tokio=warn")
    pub filter: String,
    /// Include span events (enter/exit)
    pub span_events: bool,
}

impl LogConfig {
    /// Create config for the TUI client
    pub fn client() -> Self {
        Self {
            file_name: "gridshell.log".into(),
            filter: std::env::var("GRIDSHELL_LOG").unwrap_or_else(|_| "warn".into()),
            span_events: false,
        }
    }

    /// Create config for the host daemon
    pub fn host() -> Self {
        Self {
            file_name: "gridshell-host.log".into(),
            filter: std::env::var("GRIDSHELL_LOG").unwrap_or_else(|_| "info".into()),
            span_events: true,
        }
    }
}

/// Initialize file logging with the given configuration
pub fn init_logging(config: LogConfig) -> Result<()> {
    let filter = EnvFilter::try_new(&config.filter)
        .map_err(|e| GridshellError::config(format!("Invalid log filter: {}", e)))?;

    let log_dir = paths::log_dir();
    std::fs::create_dir_all(&log_dir).map_err(|e| GridshellError::FileWrite {
        path: log_dir.clone(),
        source: e,
    })?;

    let log_path = log_dir.join(&config.file_name);
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .map_err(|e| GridshellError::FileWrite {
            path: log_path,
            source: e,
        })?;

    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_writer(file)
        .with_ansi(false);

    let fmt_layer = if config.span_events {
        fmt_layer.with_span_events(FmtSpan::ENTER | FmtSpan::EXIT)
    } else {
        fmt_layer
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| GridshellError::internal(format!("Failed to init logging: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_config_client() {
        let config = LogConfig::client();
        assert_eq!(config.file_name, "gridshell.log");
        assert!(!config.span_events);
    }

    #[test]
    fn test_log_config_host() {
        let config = LogConfig::host();
        assert_eq!(config.file_name, "gridshell-host.log");
        assert!(config.span_events);
    }
}
