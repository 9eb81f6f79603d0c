use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const CONFIG_FILE_NAME: &str = "pagewarden.toml";
pub const DB_FILE_NAME: &str = "pagewarden.db";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Directory holding the database and the optional config file.
    #[serde(skip)]
    pub data_dir: PathBuf,
    pub pagination: PaginationConfig,
    pub trash: TrashConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PaginationConfig {
    pub default_limit: u32,
    pub max_limit: u32,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_limit: 50,
            max_limit: 1000,
        }
    }
}

/// What to do when a page is trashed onto an already-trashed path.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CollisionPolicy {
    /// Fail with `Error::PathCollision`.
    #[default]
    Reject,
    /// Append `~<n>` to the trash path, choosing the smallest free `n`.
    Suffix,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TrashConfig {
    pub collision: CollisionPolicy,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StorageConfig {
    pub busy_timeout_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            busy_timeout_ms: 5000,
        }
    }
}

impl StorageConfig {
    #[must_use]
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            pagination: PaginationConfig::default(),
            trash: TrashConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl Config {
    /// Loads `<data_dir>/pagewarden.toml`, falling back to defaults when absent.
    pub fn load<P: AsRef<Path>>(data_dir: P) -> Result<Self> {
        let data_dir = data_dir.as_ref();
        let file = data_dir.join(CONFIG_FILE_NAME);

        let mut config = if file.exists() {
            let content = fs::read_to_string(&file)?;
            Self::from_toml(&content)?
        } else {
            Self::default()
        };

        config.data_dir = data_dir.to_path_buf();
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(content).map_err(|e| Error::Config(e.message().to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        let p = &self.pagination;
        if p.default_limit == 0 {
            return Err(Error::Config(
                "pagination.default_limit must be greater than zero".to_string(),
            ));
        }
        if p.max_limit < p.default_limit {
            return Err(Error::Config(format!(
                "pagination.max_limit ({}) must not be below default_limit ({})",
                p.max_limit, p.default_limit
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE_NAME)
    }

    #[must_use]
    pub fn config_path(&self) -> PathBuf {
        self.data_dir.join(CONFIG_FILE_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_without_file() {
        let temp = TempDir::new().unwrap();
        let config = Config::load(temp.path()).unwrap();
        assert_eq!(config.pagination.default_limit, 50);
        assert_eq!(config.pagination.max_limit, 1000);
        assert_eq!(config.trash.collision, CollisionPolicy::Reject);
        assert_eq!(config.db_path(), temp.path().join("pagewarden.db"));
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(CONFIG_FILE_NAME),
            "[trash]\ncollision = \"suffix\"\n",
        )
        .unwrap();

        let config = Config::load(temp.path()).unwrap();
        assert_eq!(config.trash.collision, CollisionPolicy::Suffix);
        assert_eq!(config.pagination.default_limit, 50);
        assert_eq!(config.storage.busy_timeout_ms, 5000);
    }

    #[test]
    fn test_invalid_limits_rejected() {
        let result = Config::from_toml("[pagination]\ndefault_limit = 100\nmax_limit = 10\n");
        assert!(matches!(result, Err(Error::Config(_))));

        let result = Config::from_toml("[pagination]\ndefault_limit = 0\n");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_toml_round_trip_of_written_defaults() {
        let written = Config::default().to_toml().unwrap();
        let parsed = Config::from_toml(&written).unwrap();
        assert_eq!(parsed.pagination, PaginationConfig::default());
    }
}
