//! Writer configuration.
//!
//! Loaded from `writer.json` in the project configuration directory
//! (`~/.config/vrs-writer/writer.json` on Linux) when present.

use directories::ProjectDirs;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::error::{Result, WriterError};

const CONFIG_FILE: &str = "writer.json";

pub fn get_project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("org", "vrs", "vrs-writer")
}

/// Path of the default configuration file, if a home directory is known
pub fn default_config_path() -> Option<PathBuf> {
    get_project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WriterConfig {
    /// Write to a temporary sibling file and rename it over the target
    pub atomic: bool,
    /// Flush file contents to stable storage before the rename
    pub sync: bool,
    /// Extension of the temporary file used when `atomic` is set
    pub temp_suffix: String,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            atomic: true,
            sync: true,
            temp_suffix: "tmp".to_string(),
        }
    }
}

impl WriterConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let config_error = |reason: String| WriterError::Config {
            path: path.to_path_buf(),
            reason,
        };
        let file = File::open(path).map_err(|e| config_error(e.to_string()))?;
        let config: WriterConfig = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| config_error(e.to_string()))?;
        if config.temp_suffix.is_empty() {
            return Err(config_error("tempSuffix must not be empty".to_string()));
        }
        debug!("Loaded writer configuration from {}", path.display());
        Ok(config)
    }

    /// Load the default configuration file, falling back to defaults when absent
    pub fn load_default() -> Result<Self> {
        match default_config_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Temporary path next to `target` used for atomic writes
    pub fn temp_path(&self, target: &Path) -> PathBuf {
        let mut name = target.file_name().unwrap_or_default().to_os_string();
        name.push(".");
        name.push(&self.temp_suffix);
        target.with_file_name(name)
    }
}
