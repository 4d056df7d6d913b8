#![forbid(unsafe_code)]

//! Keyboard configuration as data.
//!
//! Groups hold-repeat timing and an optional custom layout into a single
//! [`KeyboardConfig`] that can come from defaults, the environment, or (with
//! the `config-file` feature) a TOML or JSON document.
//!
//! ```toml
//! layout = ["a", "b", "br", "space", "done"]
//!
//! [repeat]
//! initial_delay_ms = 300
//! repeat_interval_ms = 40
//! ```
//!
//! # Defaults
//!
//! `KeyboardConfig::default()` reproduces the built-in widget: 250ms initial
//! delay, 50ms repeat interval, German layout.

use std::fmt;
#[cfg(feature = "config-file")]
use std::path::Path;

#[cfg(feature = "config-file")]
use serde::{Deserialize, Serialize};

use vkbd_core::hold::{
    DEFAULT_INITIAL_DELAY_MS, DEFAULT_REPEAT_INTERVAL_MS, HoldConfig, MAX_INITIAL_DELAY_MS,
    MAX_REPEAT_INTERVAL_MS, MIN_INITIAL_DELAY_MS, MIN_REPEAT_INTERVAL_MS,
};
use vkbd_core::layout::{Layout, LayoutError};
use vkbd_core::registry::KeyRegistry;
use web_time::Duration;

// ---------------------------------------------------------------------------
// RepeatConfig
// ---------------------------------------------------------------------------

/// Hold-repeat timing in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "config-file", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config-file", serde(default))]
pub struct RepeatConfig {
    /// Delay before the first repeat (default: 250).
    pub initial_delay_ms: u64,
    /// Interval between repeats (default: 50).
    pub repeat_interval_ms: u64,
}

impl Default for RepeatConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: DEFAULT_INITIAL_DELAY_MS,
            repeat_interval_ms: DEFAULT_REPEAT_INTERVAL_MS,
        }
    }
}

impl From<HoldConfig> for RepeatConfig {
    fn from(c: HoldConfig) -> Self {
        Self {
            initial_delay_ms: c.initial_delay.as_millis() as u64,
            repeat_interval_ms: c.repeat_interval.as_millis() as u64,
        }
    }
}

impl RepeatConfig {
    /// Convert to the controller's clamped timing.
    #[must_use]
    pub fn to_hold_config(self) -> HoldConfig {
        HoldConfig::default()
            .with_initial_delay(Duration::from_millis(self.initial_delay_ms))
            .with_repeat_interval(Duration::from_millis(self.repeat_interval_ms))
            .validated()
    }
}

// ---------------------------------------------------------------------------
// KeyboardConfig
// ---------------------------------------------------------------------------

/// Top-level keyboard configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "config-file", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config-file", serde(default))]
pub struct KeyboardConfig {
    /// Custom layout identifiers; `None` uses the German layout.
    #[cfg_attr(feature = "config-file", serde(skip_serializing_if = "Option::is_none"))]
    pub layout: Option<Vec<String>>,
    /// Hold-repeat timing.
    pub repeat: RepeatConfig,
}

impl KeyboardConfig {
    /// Defaults with timing overridden by `VKBD_REPEAT_DELAY_INITIAL_MS` and
    /// `VKBD_REPEAT_INTERVAL_MS`.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            repeat: HoldConfig::from_env().into(),
            layout: None,
        }
    }

    /// Set the repeat timing.
    #[must_use]
    pub fn with_repeat(mut self, repeat: RepeatConfig) -> Self {
        self.repeat = repeat;
        self
    }

    /// Set a custom layout.
    #[must_use]
    pub fn with_layout<S: Into<String>>(mut self, ids: impl IntoIterator<Item = S>) -> Self {
        self.layout = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    /// Load from a TOML string.
    #[cfg(feature = "config-file")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(ConfigError::Toml)
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "config-file")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    #[cfg(feature = "config-file")]
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(s).map_err(ConfigError::Json)
    }

    /// Load from a JSON file on disk.
    #[cfg(feature = "config-file")]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_json_str(&content)
    }

    /// Serialize to TOML.
    #[cfg(feature = "config-file")]
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::TomlSer)
    }

    /// Validate all parameters.
    ///
    /// Returns a list of problems. An empty list means the config is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if !(MIN_INITIAL_DELAY_MS..=MAX_INITIAL_DELAY_MS).contains(&self.repeat.initial_delay_ms) {
            errors.push(format!(
                "repeat.initial_delay_ms must be in [{MIN_INITIAL_DELAY_MS}, {MAX_INITIAL_DELAY_MS}], got {}",
                self.repeat.initial_delay_ms
            ));
        }
        if !(MIN_REPEAT_INTERVAL_MS..=MAX_REPEAT_INTERVAL_MS).contains(&self.repeat.repeat_interval_ms) {
            errors.push(format!(
                "repeat.repeat_interval_ms must be in [{MIN_REPEAT_INTERVAL_MS}, {MAX_REPEAT_INTERVAL_MS}], got {}",
                self.repeat.repeat_interval_ms
            ));
        }
        if let Err(e) = self.layout() {
            errors.push(format!("layout: {e}"));
        }

        errors
    }

    /// Validate, returning `self` or every problem found.
    pub fn validated(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Hold-repeat timing, clamped.
    #[must_use]
    pub fn hold(&self) -> HoldConfig {
        self.repeat.to_hold_config()
    }

    /// Build the layout this config describes.
    pub fn layout(&self) -> Result<Layout, LayoutError> {
        match &self.layout {
            Some(ids) => Layout::parse(ids),
            None => Layout::german(),
        }
    }

    /// Build the key registry this config describes.
    pub fn registry(&self) -> Result<KeyRegistry, LayoutError> {
        self.layout().map(KeyRegistry::new)
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur when loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// I/O error reading a file.
    Io(std::io::Error),
    /// TOML parse error.
    #[cfg(feature = "config-file")]
    Toml(toml::de::Error),
    /// TOML serialize error.
    #[cfg(feature = "config-file")]
    TomlSer(toml::ser::Error),
    /// JSON parse error.
    #[cfg(feature = "config-file")]
    Json(serde_json::Error),
    /// Validation errors.
    Validation(Vec<String>),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            #[cfg(feature = "config-file")]
            Self::Toml(e) => write!(f, "TOML parse error: {e}"),
            #[cfg(feature = "config-file")]
            Self::TomlSer(e) => write!(f, "TOML serialize error: {e}"),
            #[cfg(feature = "config-file")]
            Self::Json(e) => write!(f, "JSON parse error: {e}"),
            Self::Validation(errors) => write!(f, "validation errors: {}", errors.join("; ")),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            #[cfg(feature = "config-file")]
            Self::Toml(e) => Some(e),
            #[cfg(feature = "config-file")]
            Self::TomlSer(e) => Some(e),
            #[cfg(feature = "config-file")]
            Self::Json(e) => Some(e),
            Self::Validation(_) => None,
        }
    }
}
