//! gridshell host - session daemon
//!
//! Owns the PTY sessions and serves one client over a Unix socket.

use std::path::PathBuf;

use tokio::net::UnixListener;
use tracing::{info, warn};

use gridshell_protocol::DEFAULT_MAX_SESSIONS;
use gridshell_utils::{ensure_dir, init_logging, LogConfig, Result};

mod pty;
mod registry;
mod server;

struct HostArgs {
    socket: PathBuf,
    max_sessions: usize,
}

/// Parse the small flag set by hand; the host is launched by the
/// client, not by users, so clap would be overkill here.
fn parse_args() -> HostArgs {
    let mut args = HostArgs {
        socket: gridshell_utils::socket_path(),
        max_sessions: DEFAULT_MAX_SESSIONS,
    };

    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--socket" => {
                if let Some(path) = iter.next() {
                    args.socket = PathBuf::from(path);
                }
            }
            "--max-sessions" => {
                if let Some(n) = iter.next().and_then(|s| s.parse().ok()) {
                    args.max_sessions = n;
                }
            }
            other => warn!("ignoring unknown argument: {}", other),
        }
    }

    args
}

async fn run_host(args: HostArgs) -> Result<()> {
    info!(socket = %args.socket.display(), max_sessions = args.max_sessions, "host starting");

    if let Some(parent) = args.socket.parent() {
        ensure_dir(parent)?;
    }

    // A stale socket from a crashed host blocks bind
    if args.socket.exists() {
        std::fs::remove_file(&args.socket)?;
    }

    let listener = UnixListener::bind(&args.socket)?;
    let result = server::serve(listener, args.max_sessions).await;

    if let Err(e) = std::fs::remove_file(&args.socket) {
        warn!(error = %e, "failed to remove socket file");
    }

    info!("host stopped");
    result
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging(LogConfig::host())?;

    let args = parse_args();
    run_host(args).await
}
