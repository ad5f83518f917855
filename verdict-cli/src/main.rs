//! Verdict batch driver
//!
//! Runs one aggregation batch: load the previous snapshot (if any), pull a
//! time-ordered batch of classifications from the configured source, feed
//! them through the online engine, write the selection lists, and save the
//! updated snapshot.
//!
//! Usage:
//!     verdict nightly.toml
//!     verdict nightly.toml --log-level debug --max-events 500 --no-save

mod config;
mod output;
mod replay;

use std::path::PathBuf;

use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use verdict_core::{
    ClassificationEvent, ClassificationSource, OnlineEngine, ToySource, VecSource,
};
use verdict_sqlite::{Snapshot, SnapshotStore};

use crate::config::{FileConfig, SourceKind};

#[derive(Parser, Debug)]
#[command(name = "verdict")]
#[command(about = "Online Bayesian aggregation of crowd-sourced classifications")]
#[command(version)]
struct Args {
    /// Batch configuration file (TOML)
    config: PathBuf,

    /// Log level (debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Override the processing cap from the config file
    #[arg(long)]
    max_events: Option<u64>,

    /// Leave the snapshot store untouched even if the config enables saving
    #[arg(long)]
    no_save: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    info!("verdict batch driver");
    info!("  Version: {}", env!("CARGO_PKG_VERSION"));
    info!("  Config: {}", args.config.display());

    let mut file_config = FileConfig::load(&args.config)?;
    if let Some(cap) = args.max_events {
        file_config.run.max_events = cap;
    }
    file_config.run.validate()?;

    if file_config.run.agents_willing_to_learn {
        info!("agents will update their confusion matrices as new data arrives");
    } else {
        info!("agents will use current confusion matrices without updating them");
    }

    // Previous state, when a store is configured and holds a snapshot.
    let mut store = match &file_config.store.path {
        Some(path) => Some(SnapshotStore::open(path)?),
        None => None,
    };
    let snapshot = match &store {
        Some(store) => store.load()?,
        None => Snapshot::default(),
    };
    info!(
        agents = snapshot.crowd.len(),
        subjects = snapshot.sample.len(),
        checkpoint_ms = snapshot.checkpoint_ms,
        "loaded snapshot"
    );

    let mut events: Vec<ClassificationEvent> = match file_config.source.kind {
        SourceKind::Toy => {
            file_config.toy.validate()?;
            info!("doing a dry run using a toy classification source");
            drain(&mut ToySource::new(&file_config.toy))?
        }
        SourceKind::Jsonl => {
            // Presence of the path is checked at config load.
            let path = file_config.source.path.clone().unwrap_or_default();
            replay::load_events(&path)?
        }
    };

    // Only classifications made since the last run.
    if let Some(checkpoint_ms) = snapshot.checkpoint_ms {
        events.retain(|event| event.timestamp_ms > checkpoint_ms);
    }
    info!(batch = events.len(), "classifications to interpret");

    let mut engine = OnlineEngine::with_state(
        file_config.run.clone(),
        snapshot.crowd,
        snapshot.sample,
        snapshot.checkpoint_ms,
    );
    let summary = engine.run(&mut VecSource::new(events))?;

    info!(
        processed = summary.processed,
        skipped = summary.skipped,
        crowd = summary.crowd_size,
        sample = summary.sample_size,
        active = summary.active,
        detected = summary.detected,
        rejected = summary.rejected,
        state = %summary.state,
        "batch complete"
    );

    let Some(checkpoint_ms) = summary.checkpoint_ms.filter(|_| summary.processed > 0) else {
        info!("no classifications processed, going home early");
        return Ok(());
    };

    let stamp = output::finish_stamp(checkpoint_ms);
    output::write_lists(
        &file_config.output.dir,
        &file_config.output.survey,
        &stamp,
        engine.sample(),
    )?;

    match &mut store {
        Some(store) if file_config.store.save_snapshot && !args.no_save => {
            let (crowd, sample, checkpoint_ms) = engine.into_parts();
            store.save(&crowd, &sample, checkpoint_ms)?;
        }
        Some(_) => info!("snapshot saving disabled, store left untouched"),
        None => {}
    }

    Ok(())
}

fn drain<S: ClassificationSource>(
    source: &mut S,
) -> Result<Vec<ClassificationEvent>, Box<dyn std::error::Error>> {
    let mut events = Vec::new();
    while let Some(event) = source.next_event()? {
        events.push(event);
    }
    Ok(events)
}
