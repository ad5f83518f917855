//! SQLite-backed snapshot store
//!
//! Persists the full crowd and sample registry contents plus the
//! last-applied-event timestamp, so a later run can resume without
//! reprocessing or losing state. One row per entity, full model state as a
//! JSON column; saves replace the whole snapshot in a single transaction.

use rusqlite::{Connection, OptionalExtension};
use tracing::info;

use verdict_core::model::{Agent, Subject};
use verdict_core::registry::{CrowdRegistry, SampleRegistry};

use crate::error::Result;

/// Everything a resumed run needs from the previous one.
///
/// Loading from a database with no snapshot yields empty registries and no
/// checkpoint, never an error.
#[derive(Debug, Default)]
pub struct Snapshot {
    pub crowd: CrowdRegistry,
    pub sample: SampleRegistry,
    pub checkpoint_ms: Option<i64>,
}

/// SQLite-backed snapshot persistence
#[derive(Debug)]
pub struct SnapshotStore {
    conn: Connection,
}

impl SnapshotStore {
    /// Create a store from a connection that already has migrations applied.
    ///
    /// Use [`crate::migrate::migrate`] to initialize a fresh database.
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Create a new in-memory store (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        crate::migrate::migrate(&conn)?;
        Ok(Self::new(conn))
    }

    /// Create a new file-backed store
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        crate::migrate::migrate(&conn)?;
        Ok(Self::new(conn))
    }

    /// Replace the stored snapshot with the given registries and checkpoint.
    pub fn save(
        &mut self,
        crowd: &CrowdRegistry,
        sample: &SampleRegistry,
        checkpoint_ms: Option<i64>,
    ) -> Result<()> {
        let now = chrono::Utc::now().to_rfc3339();
        let tx = self.conn.unchecked_transaction()?;

        tx.execute("DELETE FROM agents", [])?;
        for (id, agent) in crowd.iter() {
            let state = serde_json::to_string(agent)?;
            tx.execute(
                "INSERT INTO agents (id, state, updated_at) VALUES (?, ?, ?)",
                rusqlite::params![id, state, now],
            )?;
        }

        tx.execute("DELETE FROM subjects", [])?;
        for (id, subject) in sample.iter() {
            let state = serde_json::to_string(subject)?;
            tx.execute(
                "INSERT INTO subjects (id, state, updated_at) VALUES (?, ?, ?)",
                rusqlite::params![id, state, now],
            )?;
        }

        tx.execute("DELETE FROM checkpoint", [])?;
        if let Some(last_event_ms) = checkpoint_ms {
            tx.execute(
                "INSERT INTO checkpoint (id, last_event_ms, updated_at) VALUES (1, ?, ?)",
                rusqlite::params![last_event_ms, now],
            )?;
        }

        tx.commit()?;

        info!(
            agents = crowd.len(),
            subjects = sample.len(),
            checkpoint_ms,
            "saved snapshot"
        );
        Ok(())
    }

    /// Load the stored snapshot, empty when nothing has been saved yet.
    pub fn load(&self) -> Result<Snapshot> {
        let mut crowd = CrowdRegistry::new();
        let mut stmt = self.conn.prepare("SELECT id, state FROM agents")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        for row in rows {
            let (id, state) = row?;
            let agent: Agent = serde_json::from_str(&state)?;
            crowd.get_or_create_with(&id, || agent);
        }

        let mut sample = SampleRegistry::new();
        let mut stmt = self.conn.prepare("SELECT id, state FROM subjects")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        for row in rows {
            let (id, state) = row?;
            let subject: Subject = serde_json::from_str(&state)?;
            sample.get_or_create_with(&id, || subject);
        }

        let checkpoint_ms: Option<i64> = self
            .conn
            .query_row("SELECT last_event_ms FROM checkpoint WHERE id = 1", [], |row| {
                row.get(0)
            })
            .optional()?;

        Ok(Snapshot {
            crowd,
            sample,
            checkpoint_ms,
        })
    }

    /// Get a reference to the underlying connection
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}
