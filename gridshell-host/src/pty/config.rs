//! PTY configuration types

use std::path::{Path, PathBuf};

use gridshell_protocol::DEFAULT_PTY_SIZE;

/// Fallback shells tried when $SHELL is unset or empty
const FALLBACK_SHELLS: [&str; 2] = ["/bin/zsh", "/bin/sh"];

/// Configuration for spawning a PTY
#[derive(Debug, Clone)]
pub struct PtyConfig {
    /// Command to execute (shell or program)
    pub command: String,
    /// Arguments to the command
    pub args: Vec<String>,
    /// Working directory
    pub cwd: Option<PathBuf>,
    /// Environment variables to set
    pub env: Vec<(String, String)>,
    /// Initial terminal size (cols, rows)
    pub size: (u16, u16),
}

impl PtyConfig {
    /// Config for the user's interactive login shell
    ///
    /// Uses $SHELL when set, otherwise the first fallback shell present
    /// on the system.
    pub fn login_shell() -> Self {
        Self {
            command: default_shell(),
            args: vec!["-i".into(), "-l".into()],
            cwd: None,
            env: terminal_env(),
            size: DEFAULT_PTY_SIZE,
        }
    }

    /// Config for a specific command (used by tests and diagnostics)
    pub fn command(cmd: impl Into<String>) -> Self {
        Self {
            command: cmd.into(),
            args: Vec::new(),
            cwd: None,
            env: terminal_env(),
            size: DEFAULT_PTY_SIZE,
        }
    }

    /// Set working directory
    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Add argument
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Set initial size
    pub fn with_size(mut self, cols: u16, rows: u16) -> Self {
        self.size = (cols, rows);
        self
    }
}

/// Pick the shell for new sessions
fn default_shell() -> String {
    if let Ok(shell) = std::env::var("SHELL") {
        if !shell.is_empty() {
            return shell;
        }
    }

    for candidate in FALLBACK_SHELLS {
        if Path::new(candidate).exists() {
            return candidate.into();
        }
    }

    // Last resort; spawn will surface the error if even this is missing
    "/bin/sh".into()
}

fn terminal_env() -> Vec<(String, String)> {
    vec![
        ("TERM".into(), "xterm-256color".into()),
        ("COLORTERM".into(), "truecolor".into()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_shell_defaults() {
        let config = PtyConfig::login_shell();
        assert_eq!(config.size, DEFAULT_PTY_SIZE);
        assert_eq!(config.args, vec!["-i", "-l"]);
        assert!(!config.command.is_empty());
    }

    #[test]
    fn test_login_shell_sets_term() {
        let config = PtyConfig::login_shell();
        assert!(config
            .env
            .iter()
            .any(|(k, v)| k == "TERM" && v == "xterm-256color"));
    }

    #[test]
    fn test_config_builder() {
        let config = PtyConfig::command("cat")
            .with_cwd("/tmp")
            .with_arg("-u")
            .with_size(120, 40);

        assert_eq!(config.command, "cat");
        assert_eq!(config.cwd, Some(PathBuf::from("/tmp")));
        assert_eq!(config.args, vec!["-u"]);
        assert_eq!(config.size, (120, 40));
    }
}
