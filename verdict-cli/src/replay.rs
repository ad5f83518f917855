//! JSON-lines event replay
//!
//! One classification event per line, in the serde format of
//! [`verdict_core::ClassificationEvent`]. The file must already be sorted
//! by non-decreasing timestamp; the engine aborts the batch otherwise.

use std::path::Path;

use thiserror::Error;
use tracing::debug;

use verdict_core::ClassificationEvent;

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("cannot read event file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("bad event on line {line}: {source}")]
    BadLine {
        line: usize,
        source: serde_json::Error,
    },
}

/// Load every event in the file, skipping blank lines.
pub fn load_events(path: &Path) -> Result<Vec<ClassificationEvent>, ReplayError> {
    let text = std::fs::read_to_string(path).map_err(|source| ReplayError::Read {
        path: path.display().to_string(),
        source,
    })?;

    let mut events = Vec::new();
    for (i, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let event: ClassificationEvent =
            serde_json::from_str(line).map_err(|source| ReplayError::BadLine {
                line: i + 1,
                source,
            })?;
        events.push(event);
    }

    debug!(path = %path.display(), count = events.len(), "loaded replay events");
    Ok(events)
}
