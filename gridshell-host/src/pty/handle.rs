//! PTY handle wrapper for portable-pty

use std::io::{Read, Write};
use std::sync::Arc;

use gridshell_utils::{GridshellError, Result};
use parking_lot::Mutex;
use portable_pty::{native_pty_system, Child, CommandBuilder, MasterPty, PtySize};

use super::PtyConfig;

/// Handle to a running PTY child process
///
/// The output reader is handed out once at spawn time and consumed by
/// the session's reader task; the handle keeps only what the registry
/// needs for input, resize, and lifecycle control.
pub struct PtyHandle {
    /// The master side of the PTY
    master: Mutex<Box<dyn MasterPty + Send>>,
    /// The child process
    child: Mutex<Box<dyn Child + Send + Sync>>,
    /// Writer for PTY input
    writer: Mutex<Box<dyn Write + Send>>,
}

/// Shared reader over the PTY output stream
pub type PtyReader = Arc<Mutex<Box<dyn Read + Send>>>;

impl PtyHandle {
    /// Spawn a process under a fresh PTY
    ///
    /// Returns the handle plus the output reader for the session's
    /// reader task. On failure nothing is left running.
    pub fn spawn(config: &PtyConfig) -> Result<(Self, PtyReader)> {
        let pty_system = native_pty_system();

        let (cols, rows) = config.size;
        let pair = pty_system
            .openpty(PtySize {
                rows,
                cols,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|e| GridshellError::pty(format!("Failed to open PTY: {}", e)))?;

        let mut cmd = CommandBuilder::new(&config.command);
        cmd.args(&config.args);

        if let Some(cwd) = &config.cwd {
            cmd.cwd(cwd);
        }

        for (key, value) in &config.env {
            cmd.env(key, value);
        }

        let child = pair
            .slave
            .spawn_command(cmd)
            .map_err(|e| GridshellError::ProcessSpawn(format!("Failed to spawn: {}", e)))?;

        let reader = pair
            .master
            .try_clone_reader()
            .map_err(|e| GridshellError::pty(format!("Failed to clone reader: {}", e)))?;

        let writer = pair
            .master
            .take_writer()
            .map_err(|e| GridshellError::pty(format!("Failed to get writer: {}", e)))?;

        let handle = Self {
            master: Mutex::new(pair.master),
            child: Mutex::new(child),
            writer: Mutex::new(writer),
        };

        Ok((handle, Arc::new(Mutex::new(reader))))
    }

    /// Write all data to the PTY (sends to the child process)
    pub fn write_all(&self, data: &[u8]) -> Result<()> {
        let mut writer = self.writer.lock();
        writer
            .write_all(data)
            .map_err(|e| GridshellError::pty(format!("Write failed: {}", e)))
    }

    /// Resize the PTY
    pub fn resize(&self, cols: u16, rows: u16) -> Result<()> {
        let master = self.master.lock();
        master
            .resize(PtySize {
                rows,
                cols,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|e| GridshellError::pty(format!("Resize failed: {}", e)))
    }

    /// Check if the child process has exited
    pub fn try_wait(&self) -> Result<Option<i32>> {
        let mut child = self.child.lock();
        match child.try_wait() {
            Ok(Some(status)) => Ok(Some(status.exit_code() as i32)),
            Ok(None) => Ok(None),
            Err(e) => Err(GridshellError::pty(format!("Wait failed: {}", e))),
        }
    }

    /// Wait for the child process to exit
    pub fn wait(&self) -> Result<i32> {
        let mut child = self.child.lock();
        match child.wait() {
            Ok(status) => Ok(status.exit_code() as i32),
            Err(e) => Err(GridshellError::pty(format!("Wait failed: {}", e))),
        }
    }

    /// Kill the child process
    pub fn kill(&self) -> Result<()> {
        let mut child = self.child.lock();
        child
            .kill()
            .map_err(|e| GridshellError::pty(format!("Kill failed: {}", e)))
    }
}

impl std::fmt::Debug for PtyHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PtyHandle").finish_non_exhaustive()
    }
}
