//! Auto-start for the gridshell host
//!
//! Running the client starts the host daemon if it is not already
//! listening, tmux-style.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use gridshell_utils::{socket_path, GridshellError, Result};

/// Host binary name
const HOST_BINARY_NAME: &str = "gridshell-host";

/// Configuration for auto-start behavior
#[derive(Debug, Clone)]
pub struct AutoStartConfig {
    /// Whether to auto-start the host if not running
    pub enabled: bool,
    /// Timeout for waiting for the host to start (milliseconds)
    pub timeout_ms: u64,
    /// Delay between connection retries (milliseconds)
    pub retry_delay_ms: u64,
    /// Initial delay after spawning the host (milliseconds)
    pub initial_delay_ms: u64,
}

impl Default for AutoStartConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_ms: 2000,
            retry_delay_ms: 200,
            initial_delay_ms: 100,
        }
    }
}

/// Find the host binary
///
/// Search order:
/// 1. Same directory as the current executable
/// 2. PATH
pub fn find_host_binary() -> Result<PathBuf> {
    if let Ok(current_exe) = std::env::current_exe() {
        if let Some(parent) = current_exe.parent() {
            let host_path = parent.join(HOST_BINARY_NAME);
            if host_path.is_file() {
                tracing::debug!("Found host binary at: {:?}", host_path);
                return Ok(host_path);
            }
        }
    }

    if let Ok(path) = which::which(HOST_BINARY_NAME) {
        tracing::debug!("Found host binary in PATH: {:?}", path);
        return Ok(path);
    }

    Err(GridshellError::Internal(format!(
        "{} binary not found. Ensure it's in the same directory as gridshell or in your PATH.",
        HOST_BINARY_NAME
    )))
}

/// Start the host as a detached background daemon
pub fn start_host_daemon(socket: &Path) -> Result<()> {
    let host_path = find_host_binary()?;

    tracing::info!("Starting host daemon: {:?}", host_path);

    Command::new(&host_path)
        .arg("--socket")
        .arg(socket)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| {
            GridshellError::ProcessSpawn(format!(
                "Failed to start {}: {}. Check that the binary is executable.",
                HOST_BINARY_NAME, e
            ))
        })?;

    tracing::info!("Host daemon started");
    Ok(())
}

/// Check if the host socket exists and is connectable
pub async fn check_host_available(socket: &Path) -> bool {
    if !socket.exists() {
        return false;
    }

    tokio::net::UnixStream::connect(socket).await.is_ok()
}

/// Wait for the host to become available with retries
pub async fn wait_for_host(socket: &Path, config: &AutoStartConfig) -> Result<()> {
    let start = Instant::now();
    let timeout = Duration::from_millis(config.timeout_ms);
    let retry_delay = Duration::from_millis(config.retry_delay_ms);

    tokio::time::sleep(Duration::from_millis(config.initial_delay_ms)).await;

    loop {
        if check_host_available(socket).await {
            tracing::debug!("Host is available after {:?}", start.elapsed());
            return Ok(());
        }

        if start.elapsed() >= timeout {
            return Err(GridshellError::ConnectionTimeout {
                seconds: config.timeout_ms / 1000,
            });
        }

        tokio::time::sleep(retry_delay).await;
    }
}

/// Result of attempting to ensure the host is running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostStartResult {
    /// Host was already running
    AlreadyRunning,
    /// Host was started by this client
    Started,
    /// Auto-start is disabled and the host is not running
    NotRunning,
}

/// Ensure the host is running, starting it if necessary
pub async fn ensure_host_running(
    socket: Option<&Path>,
    config: &AutoStartConfig,
) -> Result<HostStartResult> {
    let default_socket = socket_path();
    let socket = socket.unwrap_or(&default_socket);

    if check_host_available(socket).await {
        return Ok(HostStartResult::AlreadyRunning);
    }

    if !config.enabled {
        return Ok(HostStartResult::NotRunning);
    }

    start_host_daemon(socket)?;
    wait_for_host(socket, config).await?;

    Ok(HostStartResult::Started)
}
