//! Configuration management for sarani.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure for sarani.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory where table files are stored.
    pub data_dir: PathBuf,

    /// Whether text columns deduplicate repeated values by default.
    ///
    /// Deduplication trades write-time hashing and comparison for reduced
    /// storage. Individual columns can override this in their schema.
    pub dedup_text_columns: bool,

    /// Initial capacity in bytes for a new table's byte arena.
    pub arena_initial_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: Self::default_data_dir(),
            dedup_text_columns: true,
            arena_initial_capacity: 64 * 1024,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self =
            toml::from_str(&content).map_err(|e| crate::Error::Config(e.to_string()))?;

        config.data_dir = Self::expand_tilde(&config.data_dir);

        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Expand tilde (~) in a path.
    fn expand_tilde(path: &Path) -> PathBuf {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/".to_string());
        let path_str = path.to_string_lossy();

        if path_str == "~" {
            PathBuf::from(home)
        } else if let Some(rest) = path_str.strip_prefix("~/") {
            PathBuf::from(home).join(rest)
        } else {
            path.to_path_buf()
        }
    }

    /// Get the default data directory.
    fn default_data_dir() -> PathBuf {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
        PathBuf::from(home).join(".local").join("share").join("sarani")
    }

    /// Path to a named table file inside the data directory.
    pub fn table_path(&self, name: &str) -> PathBuf {
        self.data_dir.join(name).with_extension("srt")
    }

    /// Ensure the data directory exists.
    pub fn ensure_data_dir(&self) -> crate::Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        Ok(())
    }
}
