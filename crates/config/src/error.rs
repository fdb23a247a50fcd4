//! Errors raised while locating, loading and saving `config.toml`

use std::path::PathBuf;
use thiserror::Error;

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file exists but could not be read
    #[error("Cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The config file exists but holds only whitespace
    ///
    /// Treated as an error rather than as defaults so a truncated write is
    /// noticed instead of silently resetting every setting.
    #[error("{path} is empty")]
    Empty { path: PathBuf },

    /// The file is not TOML, or a field has the wrong type
    #[error("Cannot parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// Saving was refused because fields are out of range
    #[error("Invalid config: {}", join_fields(.0))]
    Invalid(Vec<ValidationError>),

    #[error("Cannot serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Creating the config directory, the `.backup` copy or the file itself failed
    #[error("Cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    /// No platform config directory, or a config path without a parent
    #[error("No config location: {reason}")]
    NoConfigDir { reason: String },

    /// An `AUDIOFOLIO_*` variable holds a value its field cannot take
    #[error("Invalid value for environment variable {variable}: {value}")]
    EnvOverride { variable: String, value: String },
}

impl ConfigError {
    pub(crate) fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::Write {
            path: path.into(),
            source,
        }
    }
}

fn join_fields(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ValidationError::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// A field that failed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the field, e.g. `player.tick_interval_ms`
    pub field: String,
    /// What the field must satisfy
    pub message: String,
    /// The rejected value, when it is worth echoing back
    pub value: Option<String>,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            value: None,
        }
    }

    /// Like [`ValidationError::new`], recording the rejected value
    pub fn with_value(
        field: impl Into<String>,
        message: impl Into<String>,
        value: impl ToString,
    ) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            value: Some(value.to_string()),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.value {
            Some(value) => write!(f, "{} {} (got {})", self.field, self.message, value),
            None => write!(f, "{} {}", self.field, self.message),
        }
    }
}

impl std::error::Error for ValidationError {}
