//! Annotator reliability model (confusion matrix)
//!
//! One `Agent` per distinct annotator. Its reliability pair is the
//! two-by-two confusion matrix collapsed to its diagonal:
//!
//! - `PL` = P(report positive | truth positive)
//! - `PD` = P(report negative | truth negative)
//!
//! Both are recomputed from smoothed sufficient statistics on every
//! training event heard, so only counts need to be persisted across runs.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::RunConfig;
use crate::event::Label;

/// One point on an agent's reliability trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentTracePoint {
    pub events_heard: u64,
    pub pl: f64,
    pub pd: f64,
}

/// Reliability state for a single annotator.
///
/// Created on the first event naming the annotator, never deleted: a
/// volunteer may reappear after arbitrary time and resumes from this state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    /// Annotator identifier (registry key)
    pub id: String,

    pl: f64,
    pd: f64,

    /// Laplace smoothing prior, copied from run configuration at creation
    alpha: f64,

    // Sufficient statistics over training events, per truth class.
    positive_seen: u64,
    positive_correct: u64,
    negative_seen: u64,
    negative_correct: u64,

    /// Total training events heard, including ignored ones
    events_heard: u64,

    /// Net informativeness, PL + PD - 1 (Youden's J)
    contribution: f64,

    /// Optional reliability trajectory for reporting, droppable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    history: Option<Vec<AgentTracePoint>>,
}

impl Agent {
    /// Create a fresh agent with the configured prior reliability.
    pub fn new(id: impl Into<String>, config: &RunConfig) -> Self {
        let history = config.track_history.then(Vec::new);
        Self {
            id: id.into(),
            pl: config.initial_pl,
            pd: config.initial_pd,
            alpha: config.smoothing_alpha,
            positive_seen: 0,
            positive_correct: 0,
            negative_seen: 0,
            negative_correct: 0,
            events_heard: 0,
            contribution: config.initial_pl + config.initial_pd - 1.0,
            history,
        }
    }

    /// Update reliability estimates from one training-item event.
    ///
    /// With `ignore` set (run has learning disabled) only the heard counter
    /// moves; PL and PD are pure functions of the class counts and stay put.
    pub fn heard(&mut self, report: Label, truth: Label, ignore: bool) {
        self.events_heard += 1;

        if ignore {
            return;
        }

        let correct = report == truth;
        match truth {
            Label::Positive => {
                self.positive_seen += 1;
                if correct {
                    self.positive_correct += 1;
                }
            }
            Label::Negative => {
                self.negative_seen += 1;
                if correct {
                    self.negative_correct += 1;
                }
            }
        }

        self.pl = smoothed(self.positive_correct, self.positive_seen, self.alpha);
        self.pd = smoothed(self.negative_correct, self.negative_seen, self.alpha);
        self.contribution = self.pl + self.pd - 1.0;

        if let Some(history) = &mut self.history {
            history.push(AgentTracePoint {
                events_heard: self.events_heard,
                pl: self.pl,
                pd: self.pd,
            });
        }

        debug!(
            agent = %self.id,
            pl = self.pl,
            pd = self.pd,
            contribution = self.contribution,
            "heard training classification"
        );
    }

    /// P(report positive | truth positive)
    pub fn pl(&self) -> f64 {
        self.pl
    }

    /// P(report negative | truth negative)
    pub fn pd(&self) -> f64 {
        self.pd
    }

    /// Net informativeness: zero at chance, negative when systematically
    /// wrong, approaching 1 as both reliabilities approach 1.
    pub fn contribution(&self) -> f64 {
        self.contribution
    }

    /// Total training events heard, including ignored ones.
    pub fn events_heard(&self) -> u64 {
        self.events_heard
    }

    /// Reliability trajectory, if history tracking was enabled at creation.
    pub fn history(&self) -> Option<&[AgentTracePoint]> {
        self.history.as_deref()
    }
}

fn smoothed(correct: u64, seen: u64, alpha: f64) -> f64 {
    (correct as f64 + alpha) / (seen as f64 + 2.0 * alpha)
}
