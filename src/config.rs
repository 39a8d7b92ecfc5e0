//! Configuration for the ideaflow application.
//!
//! Settings come from an optional JSON file, with the data directory
//! overridable from the environment and the command line.
use std::{
    fs,
    path::{Path, PathBuf},
};

use log::{debug, error, info};
use serde::{Deserialize, Serialize};

use crate::{IdeaflowError, Result};

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "IDEAFLOW_DATA_DIR";

/// Application configuration settings.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Directory holding the notes and categories documents
    pub data_dir: PathBuf,

    /// File name of the notes document inside `data_dir`
    pub notes_file: String,

    /// File name of the categories document inside `data_dir`
    pub categories_file: String,

    /// How many notes the recent view returns when no limit is given
    pub recent_limit: usize,

    /// How many tags the popular-tags view returns when no limit is given
    pub popular_tags_limit: usize,

    /// Address the HTTP API binds to
    pub server_addr: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            notes_file: "notes.json".to_string(),
            categories_file: "categories.json".to_string(),
            recent_limit: 5,
            popular_tags_limit: 5,
            server_addr: "127.0.0.1:3000".to_string(),
        }
    }
}

impl Config {
    /// Loads a JSON config file. Fields missing from the file keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading config from {}", path.display());
        let content = fs::read_to_string(path).map_err(|e| {
            error!("Failed to read config file {}: {}", path.display(), e);
            IdeaflowError::ConfigError {
                message: format!("cannot read {}: {}", path.display(), e),
            }
        })?;

        serde_json::from_str(&content).map_err(|e| IdeaflowError::ConfigError {
            message: format!("invalid config {}: {}", path.display(), e),
        })
    }

    /// Resolves the effective configuration.
    ///
    /// Precedence, highest first: the `data_dir` argument (command-line flag),
    /// the `IDEAFLOW_DATA_DIR` environment variable, the config file, defaults.
    pub fn resolve(config_file: Option<&Path>, data_dir: Option<PathBuf>) -> Result<Self> {
        let mut config = match config_file {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };

        if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
            if !dir.trim().is_empty() {
                config.data_dir = PathBuf::from(dir);
            }
        }

        if let Some(dir) = data_dir {
            config.data_dir = dir;
        }

        info!("Using data directory {}", config.data_dir.display());
        Ok(config)
    }

    /// Config rooted at `data_dir` with every other setting at its default.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    pub fn notes_path(&self) -> PathBuf {
        self.data_dir.join(&self.notes_file)
    }

    pub fn categories_path(&self) -> PathBuf {
        self.data_dir.join(&self.categories_file)
    }
}

// Platform data directory when one exists, otherwise ./data next to the process
fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("ideaflow"))
        .unwrap_or_else(|| PathBuf::from("data"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        fs::write(&path, r#"{"recent_limit": 9, "data_dir": "/srv/ideaflow"}"#).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.recent_limit, 9);
        assert_eq!(config.data_dir, PathBuf::from("/srv/ideaflow"));
        assert_eq!(config.popular_tags_limit, 5);
        assert_eq!(config.notes_file, "notes.json");
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let tmp = TempDir::new().unwrap();
        let err = Config::load(&tmp.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, IdeaflowError::ConfigError { .. }));
    }

    #[test]
    fn test_flag_overrides_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        fs::write(&path, r#"{"data_dir": "/from/file"}"#).unwrap();

        let config = Config::resolve(Some(&path), Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(config.data_dir, tmp.path());
        assert_eq!(config.notes_path(), tmp.path().join("notes.json"));
        assert_eq!(config.categories_path(), tmp.path().join("categories.json"));
    }
}
