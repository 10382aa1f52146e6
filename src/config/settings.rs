//! Application settings and configuration management

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Stream played by this build. Fixed at compile time, never chosen at runtime.
pub const DEFAULT_STREAM_URL: &str = match option_env!("HOPE_RADIO_STREAM_URL") {
    Some(url) => url,
    None => "https://stream.hope.ua/hopefm/live/playlist.m3u8",
};

/// Endpoint returning the current "artist - title" line.
pub const DEFAULT_INFO_URL: &str = match option_env!("HOPE_RADIO_INFO_URL") {
    Some(url) => url,
    None => "https://stream.hope.ua/hopefm/currentsong",
};

/// Application settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Settings {
    /// HLS playlist of the radio stream
    #[serde(default = "default_stream_url")]
    pub stream_url: String,
    /// URL polled for now-playing text
    #[serde(default = "default_info_url")]
    pub info_url: String,
    /// Seconds between metadata polls
    #[serde(default = "default_metadata_poll_secs")]
    pub metadata_poll_secs: u64,
    /// Seconds of inactivity before the host shuts itself down
    #[serde(default = "default_idle_stop_secs")]
    pub idle_stop_secs: u64,
    /// Output gain while another source holds ducking focus
    #[serde(default = "default_duck_volume")]
    pub duck_volume: f32,
    /// Consecutive source-error restarts before giving up (null = never give up)
    #[serde(default = "default_max_source_retries")]
    pub max_source_retries: Option<u32>,
    /// Capacity of the user command queue (callbacks are unbounded)
    #[serde(default = "default_command_buffer_size")]
    pub command_buffer_size: usize,
    /// Capacity of the state update broadcast channel
    #[serde(default = "default_state_update_capacity")]
    pub state_update_capacity: usize,
}

fn default_stream_url() -> String {
    DEFAULT_STREAM_URL.to_string()
}

fn default_info_url() -> String {
    DEFAULT_INFO_URL.to_string()
}

fn default_metadata_poll_secs() -> u64 {
    5
}

fn default_idle_stop_secs() -> u64 {
    30 * 60
}

fn default_duck_volume() -> f32 {
    0.2
}

fn default_max_source_retries() -> Option<u32> {
    Some(5)
}

fn default_command_buffer_size() -> usize {
    64
}

fn default_state_update_capacity() -> usize {
    32
}

/// Error types for configuration operations
#[derive(Debug)]
pub enum ConfigError {
    IoError(io::Error),
    ParseError(String),
    ValidationError(String),
}

impl From<io::Error> for ConfigError {
    fn from(err: io::Error) -> Self {
        ConfigError::IoError(err)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "I/O error: {}", e),
            ConfigError::ParseError(s) => write!(f, "Parse error: {}", s),
            ConfigError::ValidationError(s) => write!(f, "Validation error: {}", s),
        }
    }
}

impl Error for ConfigError {}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            stream_url: default_stream_url(),
            info_url: default_info_url(),
            metadata_poll_secs: default_metadata_poll_secs(),
            idle_stop_secs: default_idle_stop_secs(),
            duck_volume: default_duck_volume(),
            max_source_retries: default_max_source_retries(),
            command_buffer_size: default_command_buffer_size(),
            state_update_capacity: default_state_update_capacity(),
        }
    }
}

impl Settings {
    /// Load settings from a file, falling back to defaults when it does not exist
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&content)?;
        Ok(settings)
    }

    /// Save settings to a file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(&self)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, content)?;
        Ok(())
    }

    /// Get the default config file path
    pub fn default_path() -> PathBuf {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        home.join(".config").join("hope-radio").join("config.json")
    }

    pub fn metadata_poll_interval(&self) -> Duration {
        Duration::from_secs(self.metadata_poll_secs)
    }

    pub fn idle_stop_delay(&self) -> Duration {
        Duration::from_secs(self.idle_stop_secs)
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.stream_url.is_empty() {
            return Err(ConfigError::ValidationError("Stream URL cannot be empty".to_string()));
        }
        Url::parse(&self.stream_url)
            .map_err(|e| ConfigError::ValidationError(format!("Invalid stream URL: {}", e)))?;
        Url::parse(&self.info_url)
            .map_err(|e| ConfigError::ValidationError(format!("Invalid info URL: {}", e)))?;

        if self.metadata_poll_secs == 0 {
            return Err(ConfigError::ValidationError(
                "Metadata poll interval must be at least one second".to_string(),
            ));
        }

        if !(self.duck_volume > 0.0 && self.duck_volume <= 1.0) {
            return Err(ConfigError::ValidationError(format!(
                "Duck volume must be in (0, 1], got {}",
                self.duck_volume
            )));
        }

        if self.command_buffer_size == 0 || self.state_update_capacity == 0 {
            return Err(ConfigError::ValidationError(
                "Channel capacities must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}
