//! Storage layer for dg
//!
//! All durable state lives under a single data directory:
//!
//! ```text
//! <data-dir>/
//!   config.toml      # optional user configuration
//!   identity.json    # local pseudo-user, written once
//!   tasks.json       # whole task collection, rewritten on every mutation
//! ```
//!
//! The directory resolves from `--data-dir`, then `DG_DATA_DIR`, then the
//! platform data dir. Writes are atomic (temp file + rename) so a reader
//! never observes a partial collection.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{de::DeserializeOwned, Serialize};

use crate::error::{Error, Result};

const IDENTITY_FILE: &str = "identity.json";
const TASKS_FILE: &str = "tasks.json";
const CONFIG_FILE: &str = "config.toml";

/// Storage manager for dg state
#[derive(Debug, Clone)]
pub struct Storage {
    data_dir: PathBuf,
}

impl Storage {
    /// Create a storage manager rooted at an explicit directory.
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    /// Resolve the data directory: CLI flag, `DG_DATA_DIR`, then the
    /// platform-specific application data directory.
    pub fn resolve(cli_data_dir: Option<&Path>) -> Result<Self> {
        if let Some(dir) = cli_data_dir {
            return Ok(Self::new(dir.to_path_buf()));
        }

        if let Ok(dir) = std::env::var("DG_DATA_DIR") {
            let trimmed = dir.trim();
            if !trimmed.is_empty() {
                return Ok(Self::new(PathBuf::from(trimmed)));
            }
        }

        let dirs = ProjectDirs::from("", "", "dg").ok_or(Error::NoDataDir)?;
        Ok(Self::new(dirs.data_dir().to_path_buf()))
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn identity_file(&self) -> PathBuf {
        self.data_dir.join(IDENTITY_FILE)
    }

    pub fn tasks_file(&self) -> PathBuf {
        self.data_dir.join(TASKS_FILE)
    }

    pub fn config_file(&self) -> PathBuf {
        self.data_dir.join(CONFIG_FILE)
    }

    /// Read JSON data from a file
    pub fn read_json<T: DeserializeOwned>(&self, path: &Path) -> Result<T> {
        let content = fs::read_to_string(path)?;
        let data: T = serde_json::from_str(&content)?;
        Ok(data)
    }

    /// Write JSON data atomically (write to temp, then rename)
    pub fn write_json<T: Serialize>(&self, path: &Path, data: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(data)?;
        self.write_atomic(path, json.as_bytes())
    }

    /// Write data atomically using temp file + rename, so readers see
    /// either the old file or the new one, never a partial write.
    pub fn write_atomic(&self, path: &Path, data: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let temp_path = path.with_extension("tmp");
        let mut file = File::create(&temp_path)?;
        file.write_all(data)?;
        file.sync_all()?;
        fs::rename(&temp_path, path)?;

        Ok(())
    }
}
