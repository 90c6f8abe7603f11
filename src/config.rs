//! Configuration loading and types for typeclack
//!
//! Configuration is loaded in layers:
//! 1. Built-in defaults
//! 2. Config file (~/.config/typeclack/config.toml)
//! 3. CLI arguments (highest priority)

use crate::error::TypeclackError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file content
pub const DEFAULT_CONFIG: &str = r#"# typeclack configuration
#
# Location: ~/.config/typeclack/config.toml
# All settings can be overridden via CLI flags

# Stats file for external integrations (Waybar, polybar, etc.)
# Use "auto" for the default location ($XDG_RUNTIME_DIR/typeclack/stats),
# a custom path, or "disabled" to turn it off. The daemon rewrites one
# line per analytics window on every refresh tick.
stats_file = "auto"

[typewriter]
# Which soundset to load. "builtin" is synthesized and always available;
# recorded soundsets are directories under the soundsets dir, e.g.
# "royal-model-p", "olympia-sm3", "smith-corona-silent".
model = "royal-model-p"

# Carriage columns before the margin wrap fires
margin_width = 80

# Ring the bell and play a carriage return when the margin is reached
paper_return = true

# Load a fresh sheet every 25 line feeds
paper_feed = true

# Advance the carriage on the space bar
advance_on_space = false

[sound]
# Master volume (0.0 to 1.0)
volume = 0.7

# Where soundset directories live. Defaults to the data dir
# (~/.local/share/typeclack/soundsets)
# soundsets_dir = "/path/to/soundsets"

[listener]
# Listen for key events globally. Disable to run the daemon inert
# (useful together with 'typeclack play' for soundset work).
enabled = true

[analytics]
# Track key presses into rolling windows
enabled = true

# Trailing windows in seconds: 1 minute, 10 minutes, 1 hour, 1 day
windows_secs = [60, 600, 3600, 86400]

# Refresh cadence for snapshots and the stats file
refresh_interval_ms = 500
"#;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Stats file: "auto", "disabled", or an explicit path
    #[serde(default = "default_stats_file")]
    pub stats_file: Option<String>,

    #[serde(default)]
    pub typewriter: TypewriterConfig,

    #[serde(default)]
    pub sound: SoundConfig,

    #[serde(default)]
    pub listener: ListenerConfig,

    #[serde(default)]
    pub analytics: AnalyticsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TypewriterConfig {
    /// Soundset model to load
    #[serde(default = "default_model")]
    pub model: String,

    /// Carriage columns before the margin wrap fires
    #[serde(default = "default_margin_width")]
    pub margin_width: usize,

    /// Simulate the bell + carriage return at the margin
    #[serde(default = "default_true")]
    pub paper_return: bool,

    /// Simulate loading a fresh sheet every 25 line feeds
    #[serde(default = "default_true")]
    pub paper_feed: bool,

    /// Advance the carriage on the space bar
    #[serde(default)]
    pub advance_on_space: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SoundConfig {
    /// Master volume (0.0 to 1.0)
    #[serde(default = "default_volume")]
    pub volume: f32,

    /// Directory holding soundset directories; None means the data dir
    #[serde(default)]
    pub soundsets_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ListenerConfig {
    /// Listen for key events globally
    #[serde(default = "default_true")]
    pub enabled: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AnalyticsConfig {
    /// Track key presses into rolling windows
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Trailing windows, in seconds
    #[serde(default = "default_windows")]
    pub windows_secs: Vec<u64>,

    /// Refresh cadence in milliseconds
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_ms: u64,
}

fn default_stats_file() -> Option<String> {
    Some("auto".to_string())
}

fn default_model() -> String {
    "royal-model-p".to_string()
}

fn default_margin_width() -> usize {
    80
}

fn default_volume() -> f32 {
    0.7
}

fn default_windows() -> Vec<u64> {
    vec![60, 600, 3600, 86_400]
}

fn default_refresh_interval() -> u64 {
    500
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            stats_file: default_stats_file(),
            typewriter: TypewriterConfig::default(),
            sound: SoundConfig::default(),
            listener: ListenerConfig::default(),
            analytics: AnalyticsConfig::default(),
        }
    }
}

impl Default for TypewriterConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            margin_width: default_margin_width(),
            paper_return: true,
            paper_feed: true,
            advance_on_space: false,
        }
    }
}

impl Default for SoundConfig {
    fn default() -> Self {
        Self {
            volume: default_volume(),
            soundsets_dir: None,
        }
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            windows_secs: default_windows(),
            refresh_interval_ms: default_refresh_interval(),
        }
    }
}

impl Config {
    /// Get the default config file path
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "typeclack")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Get the runtime directory for ephemeral files (stats)
    pub fn runtime_dir() -> PathBuf {
        // Use XDG_RUNTIME_DIR if available, otherwise fall back to /tmp
        std::env::var("XDG_RUNTIME_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
            .join("typeclack")
    }

    /// Get the data directory path (for soundsets)
    pub fn data_dir() -> PathBuf {
        directories::ProjectDirs::from("", "", "typeclack")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Resolve the soundsets directory from config
    pub fn resolve_soundsets_dir(&self) -> PathBuf {
        self.sound
            .soundsets_dir
            .clone()
            .unwrap_or_else(|| Self::data_dir().join("soundsets"))
    }

    /// Resolve the stats file path from config
    /// Returns None if stats_file is not configured or explicitly disabled
    pub fn resolve_stats_file(&self) -> Option<PathBuf> {
        self.stats_file.as_ref().and_then(|path| {
            match path.to_lowercase().as_str() {
                "disabled" | "none" | "off" | "false" => None,
                "auto" => Some(Self::runtime_dir().join("stats")),
                _ => Some(PathBuf::from(path)),
            }
        })
    }

    /// Analytics windows as durations, in configured order
    pub fn analytics_windows(&self) -> Vec<std::time::Duration> {
        self.analytics
            .windows_secs
            .iter()
            .map(|s| std::time::Duration::from_secs(*s))
            .collect()
    }

    /// Ensure config and soundsets directories exist
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        if let Some(config_path) = Self::default_path() {
            if let Some(config_dir) = config_path.parent() {
                std::fs::create_dir_all(config_dir)?;
                tracing::debug!("Ensured config directory exists: {:?}", config_dir);
            }
        }

        let soundsets_dir = self.resolve_soundsets_dir();
        std::fs::create_dir_all(&soundsets_dir)?;
        tracing::debug!("Ensured soundsets directory exists: {:?}", soundsets_dir);

        Ok(())
    }
}

/// Load configuration from the given path, the default location, or
/// built-in defaults, in that order. Writes the commented template on
/// first run so users have something to edit.
pub fn load_config(path: Option<&Path>) -> Result<Config, TypeclackError> {
    let config_path = match path {
        Some(p) => Some(p.to_path_buf()),
        None => Config::default_path(),
    };

    let Some(config_path) = config_path else {
        return Ok(Config::default());
    };

    if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| TypeclackError::Config(format!("{}: {}", config_path.display(), e)))?;
        tracing::debug!("Loaded config from {:?}", config_path);
        Ok(config)
    } else {
        // Only seed the default location; an explicit missing path is an error
        if path.is_some() {
            return Err(TypeclackError::Config(format!(
                "Config file not found: {}",
                config_path.display()
            )));
        }
        if let Some(parent) = config_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        match std::fs::write(&config_path, DEFAULT_CONFIG) {
            Ok(()) => tracing::info!("Wrote default config to {:?}", config_path),
            Err(e) => tracing::debug!("Could not write default config: {}", e),
        }
        Ok(Config::default())
    }
}
