//! Online aggregation engine
//!
//! Sequential controller that pulls classifications from a source in
//! timestamp order and applies each one to the subject and agent models
//! through the two registries. Strictly single-threaded: agent reliability
//! after event *k* affects the weight of that agent's vote at event *k+1*,
//! so the updates do not commute.

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::RunConfig;
use crate::event::{Category, ClassificationEvent};
use crate::model::{Agent, Subject, SubjectStatus};
use crate::registry::{CrowdRegistry, SampleRegistry};
use crate::source::{ClassificationSource, SourceError};

/// Where the engine is in its lifecycle.
///
/// `Drained` and `EarlyStop` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    Init,
    Processing,
    /// Input sequence exhausted
    Drained,
    /// Processing cap hit mid-stream
    EarlyStop,
}

impl std::fmt::Display for EngineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Init => write!(f, "init"),
            Self::Processing => write!(f, "processing"),
            Self::Drained => write!(f, "drained"),
            Self::EarlyStop => write!(f, "early_stop"),
        }
    }
}

/// Engine failure. Either of these aborts the batch.
#[derive(Debug, Error)]
pub enum EngineError {
    /// An event's timestamp preceded the last applied timestamp. The
    /// source's ordering precondition was violated; continuing would
    /// silently corrupt the reliability estimates.
    #[error("event at {event_ms}ms precedes last applied event at {last_ms}ms")]
    OrderingViolation { last_ms: i64, event_ms: i64 },

    /// The batch already reached a terminal state
    #[error("batch already complete in state {0}")]
    BatchComplete(EngineState),

    #[error(transparent)]
    Source(#[from] SourceError),
}

/// Totals for one completed batch.
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub processed: u64,
    pub skipped: u64,
    pub crowd_size: usize,
    pub sample_size: usize,
    pub active: usize,
    pub detected: usize,
    pub rejected: usize,
    /// Timestamp of the last applied event, Unix ms
    pub checkpoint_ms: Option<i64>,
    pub state: EngineState,
}

/// Sequential driver over one batch of classifications.
///
/// Owns both registries for the duration of the run; hand them to the
/// persistence collaborator with [`OnlineEngine::into_parts`] afterwards.
pub struct OnlineEngine {
    config: RunConfig,
    crowd: CrowdRegistry,
    sample: SampleRegistry,
    state: EngineState,
    processed: u64,
    skipped: u64,
    checkpoint_ms: Option<i64>,
}

impl OnlineEngine {
    /// Create an engine over empty registries.
    pub fn new(config: RunConfig) -> Self {
        Self::with_state(config, CrowdRegistry::new(), SampleRegistry::new(), None)
    }

    /// Create an engine resuming from previously persisted state.
    ///
    /// `checkpoint_ms` is the last-applied-event timestamp of the earlier
    /// run; events at or before it should already have been filtered out
    /// by the caller.
    pub fn with_state(
        config: RunConfig,
        crowd: CrowdRegistry,
        sample: SampleRegistry,
        checkpoint_ms: Option<i64>,
    ) -> Self {
        Self {
            config,
            crowd,
            sample,
            state: EngineState::Init,
            processed: 0,
            skipped: 0,
            checkpoint_ms,
        }
    }

    /// Drain the source, applying each event, until it is exhausted or the
    /// processing cap is hit. Drives the engine to a terminal state.
    pub fn run<S>(&mut self, source: &mut S) -> Result<BatchSummary, EngineError>
    where
        S: ClassificationSource + ?Sized,
    {
        if matches!(self.state, EngineState::Drained | EngineState::EarlyStop) {
            return Err(EngineError::BatchComplete(self.state));
        }
        self.state = EngineState::Processing;

        while let Some(event) = source.next_event()? {
            if event.category == Category::Unusable {
                debug!(subject = %event.subject_id, "skipping unusable subject");
                self.skipped += 1;
                continue;
            }
            if let Err(invalid) = event.validate() {
                warn!(%invalid, "skipping structurally invalid event");
                self.skipped += 1;
                continue;
            }
            if let Some(last_ms) = self.checkpoint_ms {
                if event.timestamp_ms < last_ms {
                    return Err(EngineError::OrderingViolation {
                        last_ms,
                        event_ms: event.timestamp_ms,
                    });
                }
            }

            self.apply(&event);

            self.processed += 1;
            self.checkpoint_ms = Some(event.timestamp_ms);

            if self.processed == self.config.max_events {
                info!(cap = self.config.max_events, "processing cap hit, stopping early");
                self.state = EngineState::EarlyStop;
                return Ok(self.summary());
            }
        }

        self.state = EngineState::Drained;
        Ok(self.summary())
    }

    /// Apply one validated, in-order event: subject update first, using the
    /// agent's pre-update reliability, then the agent update for training
    /// events. No suspension points; the pair is atomic per event.
    fn apply(&mut self, event: &ClassificationEvent) {
        let config = &self.config;

        let subject = self.sample.get_or_create_with(&event.subject_id, || {
            Subject::new(
                &event.subject_id,
                &event.display_id,
                event.category,
                event.truth,
                event.location.clone(),
                config,
            )
        });
        let agent = self
            .crowd
            .get_or_create_with(&event.annotator, || Agent::new(&event.annotator, config));

        subject.was_described(agent, event.report, event.timestamp_ms);

        if let (Category::Training, Some(truth)) = (event.category, event.truth) {
            agent.heard(event.report, truth, !config.agents_willing_to_learn);
        }

        debug!(
            subject = %event.subject_id,
            annotator = %event.annotator,
            report = %event.report,
            probability = subject.probability(),
            status = %subject.status(),
            "applied classification"
        );
    }

    fn summary(&self) -> BatchSummary {
        let mut active = 0;
        let mut detected = 0;
        let mut rejected = 0;
        for subject in self.sample.values() {
            match subject.status() {
                SubjectStatus::Active => active += 1,
                SubjectStatus::Detected => detected += 1,
                SubjectStatus::Rejected => rejected += 1,
            }
        }

        BatchSummary {
            processed: self.processed,
            skipped: self.skipped,
            crowd_size: self.crowd.len(),
            sample_size: self.sample.len(),
            active,
            detected,
            rejected,
            checkpoint_ms: self.checkpoint_ms,
            state: self.state,
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn crowd(&self) -> &CrowdRegistry {
        &self.crowd
    }

    pub fn sample(&self) -> &SampleRegistry {
        &self.sample
    }

    /// Timestamp of the last applied event, Unix ms.
    pub fn checkpoint_ms(&self) -> Option<i64> {
        self.checkpoint_ms
    }

    /// Hand the durable state to the persistence collaborator.
    pub fn into_parts(self) -> (CrowdRegistry, SampleRegistry, Option<i64>) {
        (self.crowd, self.sample, self.checkpoint_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{EventBuilder, Label};
    use crate::source::VecSource;
    use pretty_assertions::assert_eq;

    fn training(ts: i64, annotator: &str, subject: &str, truth: Label, report: Label) -> ClassificationEvent {
        EventBuilder::new(annotator, subject)
            .timestamp(ts)
            .category(Category::Training)
            .truth(truth)
            .report(report)
            .build()
    }

    #[test]
    fn empty_batch_goes_home_early() {
        let mut engine = OnlineEngine::new(RunConfig::default());
        let mut source = VecSource::new(Vec::new());

        let summary = engine.run(&mut source).unwrap();

        assert_eq!(summary.processed, 0);
        assert_eq!(summary.skipped, 0);
        assert_eq!(summary.crowd_size, 0);
        assert_eq!(summary.sample_size, 0);
        assert_eq!(summary.checkpoint_ms, None);
        assert_eq!(summary.state, EngineState::Drained);
    }

    #[test]
    fn unusable_and_invalid_events_skip_without_counting() {
        let events = vec![
            EventBuilder::new("alice", "TUT-1")
                .timestamp(1)
                .category(Category::Unusable)
                .report(Label::Positive)
                .build(),
            // Training event missing its ground truth
            EventBuilder::new("alice", "S1")
                .timestamp(2)
                .category(Category::Training)
                .report(Label::Positive)
                .build(),
            training(3, "alice", "S2", Label::Positive, Label::Positive),
        ];
        let mut engine = OnlineEngine::new(RunConfig::default());
        let summary = engine.run(&mut VecSource::new(events)).unwrap();

        assert_eq!(summary.processed, 1);
        assert_eq!(summary.skipped, 2);
        // Skipped events touched nothing: no tutorial subject, no S1.
        assert!(!engine.sample().contains("TUT-1"));
        assert!(!engine.sample().contains("S1"));
        assert!(engine.sample().contains("S2"));
        assert_eq!(summary.checkpoint_ms, Some(3));
    }

    #[test]
    fn cap_stops_mid_stream_with_exact_checkpoint() {
        let events = vec![
            training(10, "alice", "S1", Label::Positive, Label::Positive),
            training(20, "alice", "S2", Label::Positive, Label::Positive),
            training(30, "alice", "S3", Label::Positive, Label::Positive),
        ];
        let config = RunConfig {
            max_events: 2,
            ..RunConfig::default()
        };
        let mut engine = OnlineEngine::new(config);
        let summary = engine.run(&mut VecSource::new(events)).unwrap();

        assert_eq!(summary.state, EngineState::EarlyStop);
        assert_eq!(summary.processed, 2);
        // Checkpoint is the last applied event, not the next unread one.
        assert_eq!(summary.checkpoint_ms, Some(20));
        assert!(!engine.sample().contains("S3"));
    }

    #[test]
    fn out_of_order_event_aborts_the_batch() {
        let events = vec![
            training(20, "alice", "S1", Label::Positive, Label::Positive),
            training(10, "alice", "S2", Label::Positive, Label::Positive),
        ];
        let mut engine = OnlineEngine::new(RunConfig::default());
        let err = engine.run(&mut VecSource::new(events)).unwrap_err();

        assert!(matches!(
            err,
            EngineError::OrderingViolation {
                last_ms: 20,
                event_ms: 10
            }
        ));
        // State as of the last applied event is preserved.
        assert_eq!(engine.checkpoint_ms(), Some(20));
        assert!(engine.sample().contains("S1"));
        assert!(!engine.sample().contains("S2"));
    }

    #[test]
    fn finished_engine_refuses_a_second_batch() {
        let mut engine = OnlineEngine::new(RunConfig::default());
        engine.run(&mut VecSource::new(Vec::new())).unwrap();

        let err = engine.run(&mut VecSource::new(Vec::new())).unwrap_err();
        assert!(matches!(err, EngineError::BatchComplete(EngineState::Drained)));
    }

    #[test]
    fn subject_update_uses_pre_update_reliability() {
        // A single training event: the subject must be weighed with the
        // agent's prior (chance) reliability, so its probability stays at
        // the prior even though the agent learns from the same event.
        let events = vec![training(1, "alice", "S1", Label::Positive, Label::Positive)];
        let mut engine = OnlineEngine::new(RunConfig::default());
        engine.run(&mut VecSource::new(events)).unwrap();

        let subject = engine.sample().get("S1").unwrap();
        assert_eq!(subject.probability(), 0.5);

        let agent = engine.crowd().get("alice").unwrap();
        assert!(agent.pl() > 0.5);
    }

    #[test]
    fn learning_disabled_freezes_confusion_matrices() {
        let events = vec![
            training(1, "alice", "S1", Label::Positive, Label::Positive),
            training(2, "alice", "S2", Label::Negative, Label::Negative),
        ];
        let config = RunConfig {
            agents_willing_to_learn: false,
            ..RunConfig::default()
        };
        let mut engine = OnlineEngine::new(config);
        engine.run(&mut VecSource::new(events)).unwrap();

        let agent = engine.crowd().get("alice").unwrap();
        assert_eq!(agent.pl(), 0.5);
        assert_eq!(agent.pd(), 0.5);
        assert_eq!(agent.events_heard(), 2);
    }
}
