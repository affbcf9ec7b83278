//! Optional config file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ConfigError, Result};
use crate::report::OutputFormat;

/// File name of the config file inside the config directory.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Non-secret defaults read from the config file.
///
/// Credentials are deliberately not accepted here; they come from flags or
/// environment variables only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// The API base URL.
    pub base_url: Option<String>,
    /// The workspace to report on.
    pub workspace_id: Option<String>,
    /// Iteration status filter; empty lists all statuses.
    pub iteration_status: Option<String>,
    /// Iterations requested per page.
    pub page_size: Option<u32>,
    /// Maximum pages fetched for one listing.
    pub max_pages: Option<u32>,
    /// Request timeout in seconds.
    pub timeout_secs: Option<u64>,
    /// Output format.
    pub format: Option<OutputFormat>,
}

impl Settings {
    /// Load settings.
    ///
    /// An explicit `path` must exist. Without one, the default location is
    /// used if present, otherwise empty settings are returned.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => match default_config_path() {
                Some(path) if path.is_file() => Self::load_from(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    /// Load settings from a specific file.
    pub fn load_from(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "Loading config file");
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| ConfigError::ParseError {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// The default config file location, e.g. `~/.config/tapd-report/config.toml` on Linux.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("tapd-report").join(CONFIG_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_full_file() {
        let file = write_config(
            r#"
base_url = "https://tapd.internal"
workspace_id = "20001"
iteration_status = ""
page_size = 50
max_pages = 10
timeout_secs = 5
format = "json"
"#,
        );

        let settings = Settings::load(Some(file.path())).unwrap();

        assert_eq!(settings.base_url.as_deref(), Some("https://tapd.internal"));
        assert_eq!(settings.workspace_id.as_deref(), Some("20001"));
        assert_eq!(settings.iteration_status.as_deref(), Some(""));
        assert_eq!(settings.page_size, Some(50));
        assert_eq!(settings.max_pages, Some(10));
        assert_eq!(settings.timeout_secs, Some(5));
        assert_eq!(settings.format, Some(OutputFormat::Json));
    }

    #[test]
    fn test_load_partial_file() {
        let file = write_config("workspace_id = \"1\"\n");
        let settings = Settings::load_from(file.path()).unwrap();
        assert_eq!(settings.workspace_id.as_deref(), Some("1"));
        assert!(settings.base_url.is_none());
    }

    #[test]
    fn test_secrets_are_rejected() {
        let file = write_config("app_secret = \"s3cr3t\"\n");
        let err = Settings::load_from(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Settings::load(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::ReadError { .. }));
    }

    #[test]
    fn test_default_config_path_structure() {
        if let Some(path) = default_config_path() {
            assert!(path.ends_with("tapd-report/config.toml"));
        }
    }
}
