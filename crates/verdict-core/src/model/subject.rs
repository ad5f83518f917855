//! Subject posterior model
//!
//! One `Subject` per distinct item under aggregation. Each classification
//! applies the two-state naive Bayes update using the reporting agent's
//! confusion matrix as the likelihood model, then re-evaluates retirement
//! status against the thresholds copied in at creation.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::RunConfig;
use crate::event::{Category, Label};
use crate::model::agent::Agent;

/// Retirement status, a pure function of the latest posterior.
///
/// Not sticky: every update re-evaluates it from the fresh probability.
/// Permanent retirement is a policy decision for the layer consuming this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectStatus {
    Active,
    Detected,
    Rejected,
}

impl std::fmt::Display for SubjectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Detected => write!(f, "detected"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

/// Posterior state for a single item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    /// Item identifier (registry key)
    pub id: String,

    /// External/display identifier, what goes in list files
    pub display_id: String,

    /// Current posterior probability the item is a true positive
    probability: f64,

    /// Population prior the subject started from
    prior: f64,

    pub category: Category,

    /// Ground-truth label, training subjects only
    pub truth: Option<Label>,

    status: SubjectStatus,

    // Thresholds copied from run configuration at creation.
    detection_threshold: f64,
    rejection_threshold: f64,

    /// Number of classifications applied
    votes: u64,

    /// Timestamp of the most recent classification (Unix ms)
    last_updated_ms: Option<i64>,

    /// Image URL or similar, carried for reporting
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    /// Optional posterior trajectory `(timestamp_ms, probability)`, droppable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    trajectory: Option<Vec<(i64, f64)>>,
}

impl Subject {
    /// Create a fresh subject at the population prior.
    pub fn new(
        id: impl Into<String>,
        display_id: impl Into<String>,
        category: Category,
        truth: Option<Label>,
        location: Option<String>,
        config: &RunConfig,
    ) -> Self {
        let trajectory = config.track_history.then(Vec::new);
        Self {
            id: id.into(),
            display_id: display_id.into(),
            probability: config.prior_probability,
            prior: config.prior_probability,
            category,
            truth,
            status: status_for(
                config.prior_probability,
                config.detection_threshold,
                config.rejection_threshold,
            ),
            detection_threshold: config.detection_threshold,
            rejection_threshold: config.rejection_threshold,
            votes: 0,
            last_updated_ms: None,
            location,
            trajectory,
        }
    }

    /// Apply one Bayesian update to the posterior using the reporting
    /// agent's current reliability estimate as the likelihood model.
    pub fn was_described(&mut self, by: &Agent, label: Label, at_ms: i64) {
        let p = self.probability;
        let (pl, pd) = (by.pl(), by.pd());

        let (numerator, denominator) = match label {
            Label::Positive => (p * pl, p * pl + (1.0 - p) * (1.0 - pd)),
            Label::Negative => (p * (1.0 - pl), p * (1.0 - pl) + (1.0 - p) * pd),
        };

        self.probability = if denominator > 0.0 {
            numerator / denominator
        } else {
            // Only reachable at the numeric boundary (PL = PD = 0 or 1 with
            // p already pinned at 0/1). Clamp to the nearest bound.
            let clamped = if p >= 0.5 { 1.0 } else { 0.0 };
            warn!(
                subject = %self.id,
                agent = %by.id,
                probability = p,
                clamped,
                "degenerate posterior update, clamping"
            );
            clamped
        };

        self.status = status_for(
            self.probability,
            self.detection_threshold,
            self.rejection_threshold,
        );
        self.votes += 1;
        self.last_updated_ms = Some(at_ms);

        if let Some(trajectory) = &mut self.trajectory {
            trajectory.push((at_ms, self.probability));
        }
    }

    /// Current posterior probability the item is a true positive.
    pub fn probability(&self) -> f64 {
        self.probability
    }

    /// Prior probability the subject was created with.
    pub fn prior(&self) -> f64 {
        self.prior
    }

    /// Retirement status as of the latest update.
    pub fn status(&self) -> SubjectStatus {
        self.status
    }

    /// Number of classifications applied so far.
    pub fn votes(&self) -> u64 {
        self.votes
    }

    /// Timestamp of the most recent classification, if any.
    pub fn last_updated_ms(&self) -> Option<i64> {
        self.last_updated_ms
    }

    /// Posterior trajectory, if history tracking was enabled at creation.
    pub fn trajectory(&self) -> Option<&[(i64, f64)]> {
        self.trajectory.as_deref()
    }
}

fn status_for(probability: f64, detection: f64, rejection: f64) -> SubjectStatus {
    if probability >= detection {
        SubjectStatus::Detected
    } else if probability <= rejection {
        SubjectStatus::Rejected
    } else {
        SubjectStatus::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn test_subject(config: &RunConfig) -> Subject {
        Subject::new("SUB-1", "ZOO-0001", Category::Test, None, None, config)
    }

    fn agent_with(pl: f64, pd: f64) -> Agent {
        let config = RunConfig {
            initial_pl: pl,
            initial_pd: pd,
            ..RunConfig::default()
        };
        Agent::new("alice", &config)
    }

    #[test]
    fn fresh_subject_starts_at_prior_and_active() {
        let config = RunConfig::default();
        let subject = test_subject(&config);
        assert_eq!(subject.probability(), 0.5);
        assert_eq!(subject.status(), SubjectStatus::Active);
        assert_eq!(subject.votes(), 0);
    }

    #[test]
    fn positive_report_from_good_agent_raises_probability() {
        let config = RunConfig::default();
        let mut subject = test_subject(&config);
        let agent = agent_with(0.9, 0.9);

        subject.was_described(&agent, Label::Positive, 1000);

        // 0.5 * 0.9 / (0.5 * 0.9 + 0.5 * 0.1) = 0.9
        assert!((subject.probability() - 0.9).abs() < 1e-12);
        assert_eq!(subject.votes(), 1);
        assert_eq!(subject.last_updated_ms(), Some(1000));
    }

    #[test]
    fn negative_report_from_good_agent_lowers_probability() {
        let config = RunConfig::default();
        let mut subject = test_subject(&config);
        let agent = agent_with(0.9, 0.9);

        subject.was_described(&agent, Label::Negative, 1000);

        // 0.5 * 0.1 / (0.5 * 0.1 + 0.5 * 0.9) = 0.1
        assert!((subject.probability() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn chance_agent_leaves_probability_unchanged() {
        let config = RunConfig::default();
        let mut subject = test_subject(&config);
        let agent = agent_with(0.5, 0.5);

        subject.was_described(&agent, Label::Positive, 1000);
        assert_eq!(subject.probability(), 0.5);

        subject.was_described(&agent, Label::Negative, 2000);
        assert_eq!(subject.probability(), 0.5);
    }

    #[test]
    fn crosses_detection_threshold_and_comes_back() {
        let config = RunConfig {
            detection_threshold: 0.8,
            rejection_threshold: 0.2,
            ..RunConfig::default()
        };
        let mut subject = test_subject(&config);
        let agent = agent_with(0.9, 0.9);

        subject.was_described(&agent, Label::Positive, 1000);
        assert_eq!(subject.status(), SubjectStatus::Detected);

        // Status is not sticky: a contrary vote pulls it back to active.
        subject.was_described(&agent, Label::Negative, 2000);
        assert_eq!(subject.status(), SubjectStatus::Active);
    }

    #[test]
    fn degenerate_update_clamps_instead_of_nan() {
        let config = RunConfig::default();
        let mut subject = test_subject(&config);
        let perfect = agent_with(1.0, 1.0);

        // Drive p to exactly 1.0, then ask a perfect agent to deny it.
        subject.was_described(&perfect, Label::Positive, 1000);
        assert_eq!(subject.probability(), 1.0);

        subject.was_described(&perfect, Label::Negative, 2000);
        assert_eq!(subject.probability(), 1.0);
        assert!(subject.probability().is_finite());
    }

    #[test]
    fn trajectory_records_each_update() {
        let config = RunConfig {
            track_history: true,
            ..RunConfig::default()
        };
        let mut subject = test_subject(&config);
        let agent = agent_with(0.7, 0.7);

        subject.was_described(&agent, Label::Positive, 1000);
        subject.was_described(&agent, Label::Positive, 2000);

        let trajectory = subject.trajectory().unwrap();
        assert_eq!(trajectory.len(), 2);
        assert_eq!(trajectory[0].0, 1000);
        assert!(trajectory[1].1 > trajectory[0].1);
    }
}
