//! SQLite snapshot persistence for verdict
//!
//! Stores the durable state of an aggregation run: the crowd registry, the
//! sample registry, and the last-applied-event checkpoint. The core engine
//! never touches this crate; the batch driver loads a snapshot before a run
//! and saves one after.

pub mod error;
pub mod migrate;
pub mod store;

pub use error::{Result, SqliteError};
pub use migrate::migrate;
pub use store::{Snapshot, SnapshotStore};
