//! Client configuration loaded from the user's config file

use serde::Deserialize;
use tracing::warn;

use gridshell_utils::config_file;

fn default_view_mode() -> String {
    "tabs".to_string()
}

fn default_scrollback() -> usize {
    1000
}

/// User configuration, all fields optional in the file
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Working directory for new sessions
    #[serde(default)]
    pub working_dir: Option<String>,

    /// Startup view mode: "tabs" or "grid"
    #[serde(default = "default_view_mode")]
    pub view_mode: String,

    /// Scrollback lines kept per session
    #[serde(default = "default_scrollback")]
    pub scrollback: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            working_dir: None,
            view_mode: default_view_mode(),
            scrollback: default_scrollback(),
        }
    }
}

impl Config {
    /// Load from the default config file
    ///
    /// A missing file yields defaults; a malformed file logs a warning
    /// and yields defaults rather than failing startup.
    pub fn load() -> Self {
        let path = config_file();
        let Ok(contents) = std::fs::read_to_string(&path) else {
            return Self::default();
        };
        Self::parse(&contents).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "failed to parse config, using defaults");
            Self::default()
        })
    }

    fn parse(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    pub fn starts_in_grid(&self) -> bool {
        self.view_mode == "grid"
    }
}
