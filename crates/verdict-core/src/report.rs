//! Read-only report views over the registries
//!
//! Everything here is plain data for the reporting collaborator: per-entity
//! rows plus the selection lists the original pipeline wrote out after each
//! batch. Rendering (files, plots, PDF) lives outside the core.

use serde::Serialize;

use crate::event::{Category, Label};
use crate::model::{Subject, SubjectStatus};
use crate::registry::{CrowdRegistry, SampleRegistry};

/// Reportable scalar fields of one agent.
#[derive(Debug, Clone, Serialize)]
pub struct AgentRow {
    pub id: String,
    pub pl: f64,
    pub pd: f64,
    pub contribution: f64,
    pub events_heard: u64,
}

/// Reportable scalar fields of one subject.
#[derive(Debug, Clone, Serialize)]
pub struct SubjectRow {
    pub id: String,
    pub display_id: String,
    pub probability: f64,
    pub status: SubjectStatus,
    pub category: Category,
    pub votes: u64,
    pub location: Option<String>,
}

/// All agents as report rows, sorted by id for stable output.
pub fn crowd_report(crowd: &CrowdRegistry) -> Vec<AgentRow> {
    let mut rows: Vec<AgentRow> = crowd
        .values()
        .map(|agent| AgentRow {
            id: agent.id.clone(),
            pl: agent.pl(),
            pd: agent.pd(),
            contribution: agent.contribution(),
            events_heard: agent.events_heard(),
        })
        .collect();
    rows.sort_by(|a, b| a.id.cmp(&b.id));
    rows
}

/// All subjects as report rows, sorted by id for stable output.
pub fn sample_report(sample: &SampleRegistry) -> Vec<SubjectRow> {
    let mut rows: Vec<SubjectRow> = sample
        .values()
        .map(|subject| SubjectRow {
            id: subject.id.clone(),
            display_id: subject.display_id.clone(),
            probability: subject.probability(),
            status: subject.status(),
            category: subject.category,
            votes: subject.votes(),
            location: subject.location.clone(),
        })
        .collect();
    rows.sort_by(|a, b| a.id.cmp(&b.id));
    rows
}

/// Subjects currently in the given status, sorted by id.
pub fn subjects_with_status(sample: &SampleRegistry, status: SubjectStatus) -> Vec<&Subject> {
    sorted(sample.values().filter(move |s| s.status() == status))
}

/// Test subjects retired as rejected; these come off the live survey.
pub fn retired(sample: &SampleRegistry) -> Vec<&Subject> {
    sorted(
        sample
            .values()
            .filter(|s| s.category == Category::Test && s.status() == SubjectStatus::Rejected),
    )
}

/// Test subjects that crossed the detection threshold: the candidate list.
pub fn candidates(sample: &SampleRegistry) -> Vec<&Subject> {
    sorted(
        sample
            .values()
            .filter(|s| s.category == Category::Test && s.status() == SubjectStatus::Detected),
    )
}

/// Training positives the crowd detected.
pub fn training_true_positives(sample: &SampleRegistry) -> Vec<&Subject> {
    training_with(sample, Label::Positive, SubjectStatus::Detected)
}

/// Training negatives the crowd wrongly detected.
pub fn training_false_positives(sample: &SampleRegistry) -> Vec<&Subject> {
    training_with(sample, Label::Negative, SubjectStatus::Detected)
}

/// Training positives the crowd rejected.
pub fn training_false_negatives(sample: &SampleRegistry) -> Vec<&Subject> {
    training_with(sample, Label::Positive, SubjectStatus::Rejected)
}

fn training_with(sample: &SampleRegistry, truth: Label, status: SubjectStatus) -> Vec<&Subject> {
    sorted(sample.values().filter(move |s| {
        s.category == Category::Training && s.truth == Some(truth) && s.status() == status
    }))
}

fn sorted<'a>(subjects: impl Iterator<Item = &'a Subject>) -> Vec<&'a Subject> {
    let mut list: Vec<&Subject> = subjects.collect();
    list.sort_by(|a, b| a.id.cmp(&b.id));
    list
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunConfig;
    use crate::model::Agent;
    use crate::registry::Registry;

    fn subject_at(
        id: &str,
        category: Category,
        truth: Option<Label>,
        probability_driver: &[Label],
    ) -> Subject {
        let config = RunConfig {
            detection_threshold: 0.8,
            rejection_threshold: 0.2,
            initial_pl: 0.9,
            initial_pd: 0.9,
            ..RunConfig::default()
        };
        let mut subject = Subject::new(id, id, category, truth, None, &config);
        let agent = Agent::new("driver", &config);
        for (i, label) in probability_driver.iter().enumerate() {
            subject.was_described(&agent, *label, i as i64);
        }
        subject
    }

    fn populated_sample() -> SampleRegistry {
        let mut sample: SampleRegistry = Registry::new();
        for subject in [
            subject_at("t-tp", Category::Training, Some(Label::Positive), &[Label::Positive; 3]),
            subject_at("t-fp", Category::Training, Some(Label::Negative), &[Label::Positive; 3]),
            subject_at("t-fn", Category::Training, Some(Label::Positive), &[Label::Negative; 3]),
            subject_at("x-hot", Category::Test, None, &[Label::Positive; 3]),
            subject_at("x-cold", Category::Test, None, &[Label::Negative; 3]),
            subject_at("x-open", Category::Test, None, &[]),
        ] {
            let id = subject.id.clone();
            sample.get_or_create_with(&id, || subject);
        }
        sample
    }

    fn ids(subjects: &[&Subject]) -> Vec<String> {
        subjects.iter().map(|s| s.id.clone()).collect()
    }

    #[test]
    fn candidate_and_retired_lists_cover_test_subjects_only() {
        let sample = populated_sample();

        assert_eq!(ids(&candidates(&sample)), vec!["x-hot"]);
        assert_eq!(ids(&retired(&sample)), vec!["x-cold"]);
    }

    #[test]
    fn training_outcome_lists() {
        let sample = populated_sample();

        assert_eq!(ids(&training_true_positives(&sample)), vec!["t-tp"]);
        assert_eq!(ids(&training_false_positives(&sample)), vec!["t-fp"]);
        assert_eq!(ids(&training_false_negatives(&sample)), vec!["t-fn"]);
    }

    #[test]
    fn status_filter_matches_summary_buckets() {
        let sample = populated_sample();

        assert_eq!(
            subjects_with_status(&sample, SubjectStatus::Active).len(),
            1
        );
        assert_eq!(
            subjects_with_status(&sample, SubjectStatus::Detected).len(),
            3
        );
        assert_eq!(
            subjects_with_status(&sample, SubjectStatus::Rejected).len(),
            2
        );
    }

    #[test]
    fn crowd_rows_are_sorted_and_complete() {
        let config = RunConfig::default();
        let mut crowd: CrowdRegistry = Registry::new();
        crowd.get_or_create_with("bob", || Agent::new("bob", &config));
        crowd.get_or_create_with("alice", || Agent::new("alice", &config));

        let rows = crowd_report(&crowd);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, "alice");
        assert_eq!(rows[1].id, "bob");
        assert_eq!(rows[0].contribution, 0.0);
    }
}
