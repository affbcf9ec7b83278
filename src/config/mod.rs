//! Configuration management for tapd-report.
//!
//! Settings come from command-line flags, environment variables and an
//! optional TOML file, in that order of precedence.

mod profile;
mod settings;

use std::path::PathBuf;

use thiserror::Error;

pub use profile::Profile;
pub use settings::Settings;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// The file that was read.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML or has unknown keys.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        /// The file that was parsed.
        path: PathBuf,
        /// The underlying TOML error.
        #[source]
        source: toml::de::Error,
    },

    /// A required setting was not provided.
    #[error("missing required setting: {0}")]
    MissingValue(&'static str),

    /// No usable set of credentials was provided.
    #[error("missing credentials: {0}")]
    MissingCredentials(String),

    /// A setting has an invalid value.
    #[error("{0}")]
    ValidationError(String),
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
