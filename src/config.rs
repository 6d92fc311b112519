//! Configuration loading and management.

use crate::format::OutputFormat;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Explicit config file, overrides the default search.
pub const ENV_CONFIG_PATH: &str = "WORKY_CONFIG_PATH";
/// Database path override.
pub const ENV_DB_PATH: &str = "WORKY_DB_PATH";

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub display: DisplayConfig,
}

/// Storage-specific configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path to the task database. Must end in `.worky`.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    user_dir()
        .map(|dir| dir.join("tasks.worky"))
        .unwrap_or_else(|| PathBuf::from("tasks.worky"))
}

/// Output configuration for the command line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default)]
    pub format: OutputFormat,

    /// Days from today used as the due date when `add` gets none.
    #[serde(default = "default_due_days")]
    pub default_due_days: i64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            default_due_days: default_due_days(),
        }
    }
}

fn default_due_days() -> i64 {
    14
}

/// `~/.worky`
fn user_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".worky"))
}

impl Config {
    /// Load configuration from file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_yaml(&content).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(content)?;
        Ok(config)
    }

    /// Load configuration from the explicit path, the default locations, or
    /// return defaults. Environment overrides are applied last.
    ///
    /// An explicit path that cannot be read is an error; the default
    /// locations are skipped when absent.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self> {
        let explicit = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(ENV_CONFIG_PATH).map(PathBuf::from));

        let mut config = match explicit {
            Some(path) => Self::load(path)?,
            None => Self::search_paths()
                .into_iter()
                .find(|p| p.is_file())
                .map(|p| {
                    debug!(path = %p.display(), "Loading config");
                    Self::load(p)
                })
                .transpose()?
                .unwrap_or_default(),
        };

        config.apply_env();
        Ok(config)
    }

    /// Config files tried in order: `./worky.yaml`, then `~/.worky/config.yaml`.
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("worky.yaml")];
        if let Some(dir) = user_dir() {
            paths.push(dir.join("config.yaml"));
        }
        paths
    }

    fn apply_env(&mut self) {
        if let Some(db_path) = std::env::var_os(ENV_DB_PATH) {
            self.storage.db_path = PathBuf::from(db_path);
        }
    }

    /// Ensure the database directory exists.
    pub fn ensure_db_dir(&self) -> Result<()> {
        if let Some(parent) = self.storage.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_yaml_gives_defaults() {
        let config = Config::from_yaml("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.display.default_due_days, 14);
        assert!(config.storage.db_path.to_string_lossy().ends_with("tasks.worky"));
    }

    #[test]
    fn partial_yaml_keeps_other_defaults() {
        let config = Config::from_yaml(
            "storage:\n  db_path: /tmp/work.worky\ndisplay:\n  format: json\n",
        )
        .unwrap();
        assert_eq!(config.storage.db_path, PathBuf::from("/tmp/work.worky"));
        assert_eq!(config.display.format, OutputFormat::Json);
        assert_eq!(config.display.default_due_days, 14);
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "display:\n  default_due_days: 3\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.display.default_due_days, 3);
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::load_or_default(Some(&dir.path().join("nope.yaml")));
        assert!(result.is_err());
    }

    #[test]
    fn ensure_db_dir_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.storage.db_path = dir.path().join("nested/deeper/tasks.worky");

        config.ensure_db_dir().unwrap();
        assert!(dir.path().join("nested/deeper").is_dir());
    }
}
