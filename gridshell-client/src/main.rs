//! gridshell client - terminal UI
//!
//! Opens a multiplexer window over the gridshell host: tabbed or
//! gridded shell sessions in one terminal.

use gridshell_utils::{init_logging, LogConfig, Result};

mod auto_start;
mod cli;
mod config;
mod connection;
mod input;
mod session;
mod ui;

use auto_start::{ensure_host_running, AutoStartConfig, HostStartResult};
use cli::Args;
use config::Config;
use connection::Connection;
use session::ViewMode;
use ui::App;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse arguments before touching the terminal
    let args = Args::parse_args();

    // Log to file; stderr belongs to the UI
    init_logging(LogConfig::client())?;
    tracing::info!("gridshell client starting");
    tracing::debug!("CLI args: {:?}", args);

    match run_app(args).await {
        Ok(()) => {
            tracing::info!("gridshell client exiting normally");
            Ok(())
        }
        Err(e) => {
            tracing::error!("gridshell client error: {}", e);
            // Terminal is restored by this point; stderr is visible again
            eprintln!("Error: {}", e);
            Err(e)
        }
    }
}

async fn run_app(args: Args) -> Result<()> {
    let config = Config::load();

    let auto_start_config = AutoStartConfig {
        enabled: args.auto_start_enabled(),
        timeout_ms: args.host_timeout,
        ..Default::default()
    };

    match ensure_host_running(args.socket.as_deref(), &auto_start_config).await {
        Ok(HostStartResult::AlreadyRunning) => {
            tracing::info!("Host already running");
        }
        Ok(HostStartResult::Started) => {
            tracing::info!("Host started automatically");
        }
        Ok(HostStartResult::NotRunning) => {
            eprintln!(
                "Error: Host not running. Start it with 'gridshell-host' or run without --no-auto-start"
            );
            return Err(gridshell_utils::GridshellError::HostNotRunning {
                path: args.socket.unwrap_or_else(gridshell_utils::socket_path),
            });
        }
        Err(e) => {
            eprintln!("Error: Failed to start host: {}", e);
            return Err(e);
        }
    }

    let mut connection = match args.socket {
        Some(socket) => Connection::with_socket_path(socket),
        None => Connection::new(),
    };
    connection.connect().await?;

    // CLI directory beats the config file
    let default_cwd = args
        .dir
        .map(|d| d.to_string_lossy().into_owned())
        .or(config.working_dir.clone());

    let view_mode = if config.starts_in_grid() {
        ViewMode::Grid
    } else {
        ViewMode::Tabs
    };

    let mut app = App::new(connection, default_cwd, view_mode, config.scrollback);
    app.run().await
}
