use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Environment variable naming a config file to use instead of the default.
pub const CONFIG_ENV: &str = "HOF_EXPLORER_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "hof_explorer.json";

// ---------------------------------------------------------------------------
// AppConfig
// ---------------------------------------------------------------------------

/// Where the three input tables live.  Every field may be omitted.
///
/// ```json
/// { "data_dir": "data", "peaks_file": "peaks.parquet" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Folder holding the tables.  When set, data is loaded on startup.
    pub data_dir: Option<PathBuf>,
    pub metadata_file: String,
    pub peaks_file: String,
    pub hof_file: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            metadata_file: "enhancer_metadata.feather".into(),
            peaks_file: "peak_data.parquet".into(),
            hof_file: "hof_enhancers.csv".into(),
        }
    }
}

impl AppConfig {
    /// Read the config named by [`CONFIG_ENV`], else [`DEFAULT_CONFIG_FILE`]
    /// if present, else fall back to defaults.
    pub fn load() -> Result<Self> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(Path::new(&path)),
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    Self::from_file(path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    /// File paths inside `dir`.
    pub fn paths_in(&self, dir: &Path) -> DataPaths {
        DataPaths {
            metadata: dir.join(&self.metadata_file),
            peaks: dir.join(&self.peaks_file),
            hof: dir.join(&self.hof_file),
        }
    }

    /// Paths under the configured data folder, if one is set.
    pub fn startup_paths(&self) -> Option<DataPaths> {
        self.data_dir.as_deref().map(|dir| self.paths_in(dir))
    }
}

/// Resolved locations of the three tables.
#[derive(Debug, Clone, PartialEq)]
pub struct DataPaths {
    pub metadata: PathBuf,
    pub peaks: PathBuf,
    pub hof: PathBuf,
}
