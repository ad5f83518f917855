//! Batch driver configuration file
//!
//! One TOML file per run, e.g.:
//!
//! ```toml
//! [run]
//! detection_threshold = 0.95
//! rejection_threshold = 0.05
//!
//! [source]
//! kind = "toy"
//!
//! [toy]
//! volunteers = 20
//! events = 1000
//!
//! [store]
//! path = "verdict.db"
//! save_snapshot = true
//!
//! [output]
//! dir = "output"
//! survey = "TOY"
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use verdict_core::{RunConfig, ToyConfig};

#[derive(Debug, Error)]
pub enum ConfigFileError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("source kind is \"jsonl\" but [source] has no path")]
    MissingSourcePath,
}

/// Where the batch's events come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Seeded synthetic crowd (dry run)
    Toy,
    /// Replay a JSON-lines event file
    Jsonl,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SourceSection {
    pub kind: SourceKind,
    /// Event file for the jsonl kind
    pub path: Option<PathBuf>,
}

impl Default for SourceSection {
    fn default() -> Self {
        Self {
            kind: SourceKind::Toy,
            path: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StoreSection {
    /// Snapshot database; omitted means the run keeps no durable state
    pub path: Option<PathBuf>,
    /// When false the run is read-only with respect to the store
    pub save_snapshot: bool,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            path: None,
            save_snapshot: true,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct OutputSection {
    /// Directory the list files are written into
    pub dir: PathBuf,
    /// Survey name, the prefix of every list file
    pub survey: String,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("output"),
            survey: "VERDICT".to_string(),
        }
    }
}

/// Full contents of one batch config file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub run: RunConfig,
    pub source: SourceSection,
    pub toy: ToyConfig,
    pub store: StoreSection,
    pub output: OutputSection,
}

impl FileConfig {
    /// Read and parse a config file, checking cross-section requirements.
    pub fn load(path: &Path) -> Result<Self, ConfigFileError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigFileError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: FileConfig =
            toml::from_str(&text).map_err(|source| ConfigFileError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        if config.source.kind == SourceKind::Jsonl && config.source.path.is_none() {
            return Err(ConfigFileError::MissingSourcePath);
        }

        Ok(config)
    }
}
