//! Runtime configuration loaded from `~/.astra/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::AstraError;

/// Directory name under the home directory holding config and state.
pub const DATA_DIR_NAME: &str = ".astra";
/// Config file name inside the data directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";
/// Model used when nothing else is configured.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AstraConfig {
    /// Generation model name, e.g. `gemini-2.0-flash`
    pub model: Option<String>,
    /// Provider call timeout; `0` disables the timeout
    pub timeout_seconds: Option<u64>,
    /// Delay before simulated data is served after a quota error
    pub fallback_delay_ms: Option<u64>,
    /// Where progression state is kept
    pub data_dir: Option<PathBuf>,
}

impl AstraConfig {
    /// `~/.astra`, if a home directory can be found.
    pub fn default_data_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(DATA_DIR_NAME))
    }

    /// Loads `path`, or the default config file when `path` is `None`.
    /// A missing default file yields the default config; a missing explicit
    /// file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, AstraError> {
        match path {
            Some(path) => Self::from_file(path),
            None => match Self::default_data_dir().map(|d| d.join(CONFIG_FILE_NAME)) {
                Some(default) if default.exists() => Self::from_file(&default),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, AstraError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content).map_err(|e| {
            AstraError::InvalidRequest(format!("invalid config {}: {}", path.display(), e))
        })
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    pub fn timeout(&self) -> Option<Duration> {
        match self.timeout_seconds {
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
            None => Some(crate::task::TaskConfig::DEFAULT_TIMEOUT),
        }
    }

    pub fn fallback_delay(&self) -> Duration {
        self.fallback_delay_ms
            .map(Duration::from_millis)
            .unwrap_or(crate::task::TaskConfig::DEFAULT_FALLBACK_DELAY)
    }

    /// Configured data directory, else `~/.astra`, else `./.astra`.
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .or_else(Self::default_data_dir)
            .unwrap_or_else(|| PathBuf::from(DATA_DIR_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let cfg = AstraConfig::default();
        assert_eq!(cfg.model(), DEFAULT_MODEL);
        assert_eq!(cfg.timeout(), Some(Duration::from_secs(30)));
        assert_eq!(cfg.fallback_delay(), Duration::from_millis(1500));
    }

    #[test]
    fn test_parse_toml() {
        let cfg = AstraConfig::from_toml(
            r#"
model = "gemini-1.5-flash"
timeout_seconds = 0
fallback_delay_ms = 250
data_dir = "/tmp/astra"
"#,
        )
        .unwrap();
        assert_eq!(cfg.model(), "gemini-1.5-flash");
        assert_eq!(cfg.timeout(), None);
        assert_eq!(cfg.fallback_delay(), Duration::from_millis(250));
        assert_eq!(cfg.data_dir(), PathBuf::from("/tmp/astra"));
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        assert!(AstraConfig::from_toml("modle = \"typo\"").is_err());
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope.toml");
        assert!(AstraConfig::load(Some(&missing)).is_err());
    }

    #[test]
    fn test_load_explicit_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "timeout_seconds = 12\n").unwrap();
        let cfg = AstraConfig::load(Some(&path)).unwrap();
        assert_eq!(cfg.timeout(), Some(Duration::from_secs(12)));
    }
}
