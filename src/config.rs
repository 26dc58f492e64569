//! Configuration to acknowledge user preferences as well as set defaults.
//!
//! Specifically, we try to find a sectional.toml, and if present we load settings from there.
//! This provides the hide/show style names, highlight colour, refresh timing, logging level and
//! the text-transform endpoint defaults.

use crate::operations::VisibilityStyles;
use facet::Facet;
use log::LevelFilter;
use std::path::Path;
use std::time::Duration;
use std::{fs, io};

/// File looked up in the working directory.
pub const CONFIG_FILE: &str = "sectional.toml";

/// Failure to load configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// File path.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The file is not valid TOML for this schema.
    #[error("invalid configuration: {0}")]
    Parse(String),
}

#[derive(Facet, Clone, Debug)]
/// User preferences loaded from sectional.toml or falling back to defaults.
pub struct Config {
    #[facet(default = "HiddenContent".to_string())]
    /// Paragraph style applied to hide a collapsed section body.
    pub hidden_style: String,
    #[facet(default = "Normal".to_string())]
    /// Paragraph style restored when a section is expanded.
    pub visible_style: String,
    #[facet(default = "Yellow".to_string())]
    /// Highlight colour used by the navigator's highlight command.
    pub highlight_color: String,
    #[facet(default = 2000)]
    /// Quiet period after a selection change before the outline refreshes.
    pub refresh_debounce_ms: u64,
    #[facet(default = "info".to_string())]
    /// Log level name (`off`, `error`, `warn`, `info`, `debug`, `trace`).
    pub log_level: String,
    #[facet(default = "gpt-4o".to_string())]
    /// Default model for text-transform requests.
    pub model: String,
    #[facet(default = "https://api.openai.com/v1/chat/completions".to_string())]
    /// Chat-completion endpoint for text-transform requests.
    pub endpoint: String,
    #[facet(default = 2000)]
    /// Completion token limit.
    pub max_tokens: u32,
    #[facet(default = 0.3)]
    /// Sampling temperature.
    pub temperature: f64,
    #[facet(default = crate::formats::supported_extensions())]
    /// File suffixes the navigator accepts. Defaults to every extension a format reads.
    pub file_extensions: Vec<String>,
}

impl Config {
    /// Load configuration from sectional.toml if present, otherwise defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    /// Load configuration from `path`, falling back to defaults when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match fs::read_to_string(path) {
            Ok(contents) => Self::from_toml(&contents),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Self::from_toml(""),
            Err(source) => Err(ConfigError::Read {
                path: path.display().to_string(),
                source,
            }),
        }
    }

    /// Parse configuration from TOML text; missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid for this schema.
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        facet_toml::from_str::<Self>(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    #[must_use]
    /// Style names for the hide/show toggle.
    pub fn visibility_styles(&self) -> VisibilityStyles {
        VisibilityStyles {
            hidden: self.hidden_style.clone(),
            visible: self.visible_style.clone(),
        }
    }

    #[must_use]
    /// Debounce period for selection-change refreshes.
    pub fn refresh_wait(&self) -> Duration {
        Duration::from_millis(self.refresh_debounce_ms)
    }

    #[must_use]
    /// Parsed log level, `Info` when the name is not recognised.
    pub fn level_filter(&self) -> LevelFilter {
        self.log_level.parse().unwrap_or(LevelFilter::Info)
    }
}

#[cfg(test)]
#[path = "tests/config.rs"]
mod tests;
