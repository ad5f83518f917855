//! Seeded toy classification source
//!
//! Generates a synthetic crowd and subject population, then a time-ordered
//! stream of classifications, for dry runs and end-to-end tests without a
//! real database. Deterministic per seed.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::ConfigError;
use crate::event::{Category, ClassificationEvent, EventBuilder, Label};
use crate::source::{ClassificationSource, SourceError, VecSource};

/// Parameters of the synthetic population.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToyConfig {
    /// Number of volunteers in the toy crowd (default: 20)
    pub volunteers: usize,
    /// Number of subjects in the toy survey (default: 50)
    pub subjects: usize,
    /// Fraction of subjects that carry ground truth (default: 0.5)
    pub training_fraction: f64,
    /// Probability a subject is a true positive (default: 0.5)
    pub positive_rate: f64,
    /// Length of the generated event stream (default: 1000)
    pub events: usize,
    /// RNG seed; identical seeds reproduce identical streams (default: 42)
    pub seed: u64,
    /// Timestamp of the first event, Unix ms (default: 1_700_000_000_000)
    pub start_ms: i64,
    /// Milliseconds between consecutive events (default: 1000)
    pub step_ms: i64,
}

impl Default for ToyConfig {
    fn default() -> Self {
        Self {
            volunteers: 20,
            subjects: 50,
            training_fraction: 0.5,
            positive_rate: 0.5,
            events: 1000,
            seed: 42,
            start_ms: 1_700_000_000_000,
            step_ms: 1000,
        }
    }
}

impl ToyConfig {
    /// Validate field ranges before generating a stream.
    ///
    /// [`ToySource::new`] draws with these values as probabilities, so they
    /// must be checked first when they come from user configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("training_fraction", self.training_fraction),
            ("positive_rate", self.positive_rate),
        ] {
            if !(0.0..=1.0).contains(&value) || !value.is_finite() {
                return Err(ConfigError::OutOfRange { field, value });
            }
        }
        Ok(())
    }
}

struct ToySubject {
    id: String,
    display_id: String,
    category: Category,
    truth: Label,
    location: String,
}

/// Synthetic event source backed by a pre-generated, timestamp-ordered
/// stream.
pub struct ToySource {
    inner: VecSource,
}

impl ToySource {
    pub fn new(config: &ToyConfig) -> Self {
        if config.volunteers == 0 || config.subjects == 0 {
            return Self {
                inner: VecSource::new(Vec::new()),
            };
        }

        let mut rng = StdRng::seed_from_u64(config.seed);

        // Each volunteer gets a hidden accuracy; some are worse than chance.
        let accuracies: Vec<f64> = (0..config.volunteers)
            .map(|_| rng.gen_range(0.35..0.95))
            .collect();

        let subjects: Vec<ToySubject> = (0..config.subjects)
            .map(|i| {
                let category = if rng.gen_bool(config.training_fraction) {
                    Category::Training
                } else {
                    Category::Test
                };
                let truth = if rng.gen_bool(config.positive_rate) {
                    Label::Positive
                } else {
                    Label::Negative
                };
                ToySubject {
                    id: format!("toy-subject-{}", i),
                    display_id: format!("TOY{:05}", i),
                    category,
                    truth,
                    location: format!("http://toy.survey/images/{:05}.png", i),
                }
            })
            .collect();

        let events = (0..config.events)
            .map(|i| {
                let v = rng.gen_range(0..config.volunteers);
                let subject = &subjects[rng.gen_range(0..subjects.len())];

                // Report correctly with the volunteer's hidden accuracy.
                let report = if rng.gen_bool(accuracies[v]) {
                    subject.truth
                } else {
                    match subject.truth {
                        Label::Positive => Label::Negative,
                        Label::Negative => Label::Positive,
                    }
                };

                let mut builder = EventBuilder::new(format!("toy-volunteer-{}", v), &subject.id)
                    .timestamp(config.start_ms + i as i64 * config.step_ms)
                    .display_id(&subject.display_id)
                    .category(subject.category)
                    .report(report)
                    .location(&subject.location);
                if subject.category == Category::Training {
                    builder = builder.truth(subject.truth);
                }
                builder.build()
            })
            .collect();

        info!(
            volunteers = config.volunteers,
            subjects = config.subjects,
            events = config.events,
            seed = config.seed,
            "generated toy classification stream"
        );

        Self {
            inner: VecSource::new(events),
        }
    }
}

impl ClassificationSource for ToySource {
    fn next_event(&mut self) -> Result<Option<ClassificationEvent>, SourceError> {
        self.inner.next_event()
    }

    fn remaining(&self) -> Option<usize> {
        self.inner.remaining()
    }
}
