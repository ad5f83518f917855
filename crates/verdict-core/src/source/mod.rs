//! Classification source seam
//!
//! The engine pulls events from a [`ClassificationSource`] and knows nothing
//! about where they come from. Implementations here:
//!
//! - [`VecSource`]: in-memory sequence, for tests and file replay
//! - [`ToySource`]: seeded synthetic crowd, for dry runs without real data

pub mod toy;

use std::collections::VecDeque;

use thiserror::Error;

use crate::event::ClassificationEvent;

pub use toy::{ToyConfig, ToySource};

/// Failure while pulling from a source backend.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Backend-specific read failure
    #[error("source backend error: {0}")]
    Backend(String),

    /// A record that could not be decoded into an event
    #[error("undecodable record: {0}")]
    Decode(String),
}

/// Pull-based, possibly unbounded sequence of classification events.
///
/// Precondition: implementations must yield events in non-decreasing
/// timestamp order. The engine does not sort; it only carries a defensive
/// check that aborts the batch on a violation.
pub trait ClassificationSource {
    /// Pull the next event, or `None` when the sequence is exhausted.
    fn next_event(&mut self) -> Result<Option<ClassificationEvent>, SourceError>;

    /// Hint of how many events remain, when the backend knows.
    fn remaining(&self) -> Option<usize> {
        None
    }
}

/// In-memory event source.
///
/// The caller is responsible for the timestamp-order precondition; this
/// type hands events out exactly as given.
#[derive(Debug, Default)]
pub struct VecSource {
    events: VecDeque<ClassificationEvent>,
}

impl VecSource {
    pub fn new(events: Vec<ClassificationEvent>) -> Self {
        Self {
            events: events.into(),
        }
    }
}

impl ClassificationSource for VecSource {
    fn next_event(&mut self) -> Result<Option<ClassificationEvent>, SourceError> {
        Ok(self.events.pop_front())
    }

    fn remaining(&self) -> Option<usize> {
        Some(self.events.len())
    }
}
