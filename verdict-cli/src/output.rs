//! Post-batch list files
//!
//! After a batch, five plain-text lists go to the output directory, named
//! `<survey>_<finish-stamp>_<kind>.txt` where the finish stamp is the time
//! of the last applied classification. One display id per line, followed by
//! the image location when known.

use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::info;

use verdict_core::model::Subject;
use verdict_core::{report, SampleRegistry};

/// Finish stamp for file naming, from the batch checkpoint (Unix ms).
pub fn finish_stamp(checkpoint_ms: i64) -> String {
    let secs = checkpoint_ms / 1000;
    let nanos = ((checkpoint_ms % 1000) * 1_000_000) as u32;
    match chrono::DateTime::from_timestamp(secs, nanos) {
        Some(dt) => dt.format("%Y-%m-%d_%H-%M-%S").to_string(),
        None => format!("at-{}", checkpoint_ms),
    }
}

/// Write all five selection lists. Returns the paths written.
pub fn write_lists(
    dir: &Path,
    survey: &str,
    stamp: &str,
    sample: &SampleRegistry,
) -> std::io::Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;

    let lists: [(&str, Vec<&Subject>); 5] = [
        ("retire_these", report::retired(sample)),
        ("candidates", report::candidates(sample)),
        ("training_true_positives", report::training_true_positives(sample)),
        ("training_false_positives", report::training_false_positives(sample)),
        ("training_false_negatives", report::training_false_negatives(sample)),
    ];

    let mut written = Vec::with_capacity(lists.len());
    for (kind, subjects) in lists {
        let path = dir.join(format!("{}_{}_{}.txt", survey, stamp, kind));
        let lines = write_list(&path, &subjects)?;
        info!(path = %path.display(), lines, "wrote {} list", kind);
        written.push(path);
    }
    Ok(written)
}

fn write_list(path: &Path, subjects: &[&Subject]) -> std::io::Result<usize> {
    let mut file = std::fs::File::create(path)?;
    for subject in subjects {
        match &subject.location {
            Some(location) => writeln!(file, "{} {}", subject.display_id, location)?,
            None => writeln!(file, "{}", subject.display_id)?,
        }
    }
    Ok(subjects.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use verdict_core::{Category, EventBuilder, Label, OnlineEngine, RunConfig, VecSource};

    #[test]
    fn stamp_formats_checkpoint_time() {
        // 2024-01-01 00:00:00 UTC
        assert_eq!(finish_stamp(1_704_067_200_000), "2024-01-01_00-00-00");
    }

    #[test]
    fn writes_all_five_lists() {
        let events = vec![
            EventBuilder::new("alice", "S1")
                .timestamp(1_000)
                .category(Category::Test)
                .report(Label::Positive)
                .location("http://example.org/s1.png")
                .build(),
        ];
        let mut engine = OnlineEngine::new(RunConfig::default());
        engine.run(&mut VecSource::new(events)).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let written = write_lists(dir.path(), "TOY", "2024-01-01_00-00-00", engine.sample()).unwrap();

        assert_eq!(written.len(), 5);
        for path in &written {
            assert!(path.exists());
            let name = path.file_name().unwrap().to_string_lossy().to_string();
            assert!(name.starts_with("TOY_2024-01-01_00-00-00_"));
        }
    }

    #[test]
    fn retired_lines_carry_display_id_and_location() {
        let config = RunConfig {
            detection_threshold: 0.8,
            rejection_threshold: 0.2,
            initial_pl: 0.9,
            initial_pd: 0.9,
            ..RunConfig::default()
        };
        let events = vec![
            EventBuilder::new("alice", "S1")
                .timestamp(1_000)
                .display_id("ZOO-0001")
                .category(Category::Test)
                .report(Label::Negative)
                .location("http://example.org/s1.png")
                .build(),
        ];
        let mut engine = OnlineEngine::new(config);
        engine.run(&mut VecSource::new(events)).unwrap();

        let dir = tempfile::tempdir().unwrap();
        write_lists(dir.path(), "TOY", "stamp", engine.sample()).unwrap();

        let retired = std::fs::read_to_string(dir.path().join("TOY_stamp_retire_these.txt")).unwrap();
        assert_eq!(retired, "ZOO-0001 http://example.org/s1.png\n");
    }
}
