//! Command-line argument parsing for the gridshell client

use clap::Parser;
use std::path::PathBuf;

/// gridshell - multi-session terminal multiplexer client
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Disable automatic host startup
    ///
    /// By default, gridshell starts the host daemon if it is not
    /// already running. With this flag the client fails immediately
    /// instead.
    #[arg(long, default_value_t = false)]
    pub no_auto_start: bool,

    /// Host startup timeout in milliseconds
    ///
    /// How long to wait for the host when auto-starting.
    #[arg(long, default_value_t = 2000)]
    pub host_timeout: u64,

    /// Custom socket path
    ///
    /// Override the default Unix socket path for connecting to the host.
    #[arg(long, short = 'S', env = "GRIDSHELL_SOCKET")]
    pub socket: Option<PathBuf>,

    /// Working directory for new sessions
    #[arg(long, short = 'C')]
    pub dir: Option<PathBuf>,
}

impl Args {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn auto_start_enabled(&self) -> bool {
        !self.no_auto_start
    }
}
