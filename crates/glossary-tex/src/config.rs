//! Configuration for glossary parsing and export
//!
//! Markers and layout constants of the glossary document dialect. Defaults
//! match the files written by the glossary editor; a TOML file can override
//! them:
//!
//! ```toml
//! entry_marker = "\\newglossaryentry"
//! default_entry_type = "\\acronymtype"
//! section_keyword = "DEFINIZIONI"
//! default_category = "Generale"
//! banner_width = 41
//! indent = 4
//! skip_default_category_on_export = true
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// File name looked up under the user's configuration directory
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Application directory name under the platform configuration directory
pub const APP_DIR_NAME: &str = "glossary-tex";

/// Accepted range for `banner_width`
pub const MIN_BANNER_WIDTH: u32 = 3;
pub const MAX_BANNER_WIDTH: u32 = 200;

/// Largest accepted `indent`
pub const MAX_INDENT: u32 = 16;

/// Glossary dialect configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Record))]
#[serde(default)]
pub struct GlossaryConfig {
    /// Command introducing an entry
    pub entry_marker: String,
    /// `type=` value written when an entry has none
    pub default_entry_type: String,
    /// Word marking a category header line, e.g. `% DEFINIZIONI Physics`
    pub section_keyword: String,
    /// Category receiving entries that precede any header
    pub default_category: String,
    /// Number of `%` characters in a section banner
    pub banner_width: u32,
    /// Spaces before each field line of a serialized entry
    pub indent: u32,
    /// Leave the default category out of exported documents
    pub skip_default_category_on_export: bool,
}

impl Default for GlossaryConfig {
    fn default() -> Self {
        Self {
            entry_marker: "\\newglossaryentry".to_string(),
            default_entry_type: "\\acronymtype".to_string(),
            section_keyword: "DEFINIZIONI".to_string(),
            default_category: "Generale".to_string(),
            banner_width: 41,
            indent: 4,
            skip_default_category_on_export: true,
        }
    }
}

impl GlossaryConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// The section banner line
    pub fn banner(&self) -> String {
        "%".repeat(self.banner_width as usize)
    }

    /// Indentation prefix for field lines
    pub fn indentation(&self) -> String {
        " ".repeat(self.indent as usize)
    }

    /// Load configuration from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    /// Load configuration from a JSON string
    pub fn from_json(json_str: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json_str).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to JSON
    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_toml(&content)
    }

    /// Default configuration file location, e.g.
    /// `~/.config/glossary-tex/config.toml` on Linux
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load from the default location, falling back to defaults when the
    /// file is missing or invalid
    pub fn load_or_default() -> Self {
        let Some(path) = Self::default_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::load(&path) {
            Ok(config) => {
                tracing::debug!("Loaded configuration from {:?}", path);
                config
            }
            Err(e) => {
                tracing::warn!("Failed to load configuration: {}, using defaults", e);
                Self::default()
            }
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.entry_marker.starts_with('\\') || self.entry_marker.len() < 2 {
            return Err(ConfigError::InvalidValue(
                "entry_marker must be a command such as \\newglossaryentry".to_string(),
            ));
        }
        if self.section_keyword.trim().is_empty() {
            return Err(ConfigError::MissingField("section_keyword".to_string()));
        }
        if self.default_category.trim().is_empty() {
            return Err(ConfigError::MissingField("default_category".to_string()));
        }
        if self.default_entry_type.trim().is_empty() {
            return Err(ConfigError::MissingField("default_entry_type".to_string()));
        }
        if !(MIN_BANNER_WIDTH..=MAX_BANNER_WIDTH).contains(&self.banner_width) {
            return Err(ConfigError::InvalidValue(format!(
                "banner_width must be between {} and {}",
                MIN_BANNER_WIDTH, MAX_BANNER_WIDTH
            )));
        }
        if self.indent > MAX_INDENT {
            return Err(ConfigError::InvalidValue(format!(
                "indent must be at most {}",
                MAX_INDENT
            )));
        }
        Ok(())
    }
}

/// Errors raised while loading or validating configuration
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Config parse error: {0}")]
    Parse(String),

    #[error("Config serialize error: {0}")]
    Serialize(String),

    #[error("Missing field: {0}")]
    MissingField(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),
}
