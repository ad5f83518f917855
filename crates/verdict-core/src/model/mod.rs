//! Per-annotator and per-item statistical models
//!
//! Two stateful models updated in lockstep by the engine:
//!
//! - [`Agent`]: an annotator's confusion matrix, learned from training events
//! - [`Subject`]: an item's posterior probability of being a true positive
//!
//! The coupling is one-directional per event: a subject update consumes the
//! agent's reliability as it stood *before* that event, so an annotator's
//! own vote never influences the weight given to that same vote.

pub mod agent;
pub mod subject;

pub use agent::{Agent, AgentTracePoint};
pub use subject::{Subject, SubjectStatus};
