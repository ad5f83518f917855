//! Classification event definitions
//!
//! A classification event is the fundamental unit of input: one annotator
//! looking at one subject at one moment and reporting a binary judgment.
//! Events are immutable once built; the engine only reads them.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Binary judgment reported by an annotator, or held as ground truth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Positive,
    Negative,
}

impl Label {
    /// Returns true if the label is `Positive`.
    pub fn is_positive(&self) -> bool {
        *self == Self::Positive
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Positive => write!(f, "positive"),
            Self::Negative => write!(f, "negative"),
        }
    }
}

/// What kind of subject the event names.
///
/// Training subjects carry known ground truth and calibrate annotator
/// reliability. Test subjects are the aggregation targets. Unusable subjects
/// (tutorials, broken images) are skipped outright by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Training,
    Test,
    Unusable,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Training => write!(f, "training"),
            Self::Test => write!(f, "test"),
            Self::Unusable => write!(f, "unusable"),
        }
    }
}

/// Screen location of the marker the annotator placed.
///
/// Carried through to reporting; never interpreted by the core model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub x: f64,
    pub y: f64,
}

/// One annotator's judgment of one subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationEvent {
    /// When the classification was made (Unix timestamp milliseconds)
    pub timestamp_ms: i64,

    /// Who made the classification
    pub annotator: String,

    /// Internal identifier of the subject being classified
    pub subject_id: String,

    /// External/display identifier of the subject (what goes in list files)
    pub display_id: String,

    /// Training, test, or unusable
    pub category: Category,

    /// Ground-truth label; required for training events, absent otherwise
    pub truth: Option<Label>,

    /// The label the annotator reported
    pub report: Label,

    /// Marker location, carried but not interpreted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker: Option<Marker>,

    /// Image URL or similar, carried for reporting
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// Structural validation failure for a single event.
///
/// The engine treats a failing event as unusable: skip, don't count,
/// don't mutate any state. It is never a hard failure of the batch.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidEvent {
    /// Training-tagged event with no ground-truth label
    #[error("training event on subject {0} has no ground truth")]
    MissingTruth(String),

    /// Ground-truth label on an event that should not carry one
    #[error("{category} event on subject {subject} carries a ground-truth label")]
    UnexpectedTruth { subject: String, category: Category },
}

impl ClassificationEvent {
    /// Check the event's structural invariants: `truth` must be present on
    /// training events and absent everywhere else.
    pub fn validate(&self) -> Result<(), InvalidEvent> {
        match (self.category, self.truth.is_some()) {
            (Category::Training, false) => {
                Err(InvalidEvent::MissingTruth(self.subject_id.clone()))
            }
            (Category::Training, true) => Ok(()),
            (category, true) => Err(InvalidEvent::UnexpectedTruth {
                subject: self.subject_id.clone(),
                category,
            }),
            (_, false) => Ok(()),
        }
    }
}

/// Builder for classification events
#[derive(Debug)]
pub struct EventBuilder {
    event: ClassificationEvent,
}

impl EventBuilder {
    pub fn new(annotator: impl Into<String>, subject_id: impl Into<String>) -> Self {
        let subject_id = subject_id.into();
        Self {
            event: ClassificationEvent {
                timestamp_ms: 0,
                annotator: annotator.into(),
                display_id: subject_id.clone(),
                subject_id,
                category: Category::Test,
                truth: None,
                report: Label::Negative,
                marker: None,
                location: None,
            },
        }
    }

    pub fn timestamp(mut self, timestamp_ms: i64) -> Self {
        self.event.timestamp_ms = timestamp_ms;
        self
    }

    pub fn display_id(mut self, display_id: impl Into<String>) -> Self {
        self.event.display_id = display_id.into();
        self
    }

    pub fn category(mut self, category: Category) -> Self {
        self.event.category = category;
        self
    }

    pub fn truth(mut self, truth: Label) -> Self {
        self.event.truth = Some(truth);
        self
    }

    pub fn report(mut self, report: Label) -> Self {
        self.event.report = report;
        self
    }

    pub fn marker(mut self, x: f64, y: f64) -> Self {
        self.event.marker = Some(Marker { x, y });
        self
    }

    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.event.location = Some(location.into());
        self
    }

    pub fn build(self) -> ClassificationEvent {
        self.event
    }
}
