//! Verdict Core Engine
//!
//! Online Bayesian aggregation of crowd-sourced binary labels. A stream of
//! classification events is applied one at a time, in timestamp order, to
//! two coupled models: each annotator's confusion matrix (learned from
//! events on subjects with known ground truth) and each subject's posterior
//! probability of being a true positive (updated on every event, weighted
//! by the reporting annotator's current reliability).
//!
//! # Example
//!
//! ```rust
//! use verdict_core::config::RunConfig;
//! use verdict_core::engine::OnlineEngine;
//! use verdict_core::event::{Category, EventBuilder, Label};
//! use verdict_core::source::VecSource;
//!
//! let events = vec![EventBuilder::new("alice", "SUB-1")
//!     .timestamp(1_000)
//!     .category(Category::Training)
//!     .truth(Label::Positive)
//!     .report(Label::Positive)
//!     .build()];
//!
//! let mut engine = OnlineEngine::new(RunConfig::default());
//! let summary = engine.run(&mut VecSource::new(events)).unwrap();
//! assert_eq!(summary.processed, 1);
//! ```

pub mod config;
pub mod engine;
pub mod event;
pub mod model;
pub mod registry;
pub mod report;
pub mod source;

// Re-export main types at crate root
pub use config::{ConfigError, RunConfig};
pub use engine::{BatchSummary, EngineError, EngineState, OnlineEngine};
pub use event::{Category, ClassificationEvent, EventBuilder, InvalidEvent, Label, Marker};
pub use model::{Agent, Subject, SubjectStatus};
pub use registry::{CrowdRegistry, Registry, SampleRegistry};
pub use source::{ClassificationSource, SourceError, ToyConfig, ToySource, VecSource};
