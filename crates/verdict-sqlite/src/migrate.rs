//! Database migration runner
//!
//! Embeds the snapshot schema and applies it idempotently through a
//! schema_migrations table.

use rusqlite::Connection;

use crate::error::Result;

const MIGRATIONS: &[(&str, &str)] = &[
    (
        "000",
        include_str!("../migrations/000_create_schema_migrations.sql"),
    ),
    (
        "001",
        include_str!("../migrations/001_create_snapshot_tables.sql"),
    ),
];

/// Apply all pending migrations to the database.
///
/// Creates the schema_migrations table if it doesn't exist, then applies
/// any migrations that haven't been applied yet.
pub fn migrate(conn: &Connection) -> Result<()> {
    for (version, sql) in MIGRATIONS {
        apply_migration(conn, version, sql)?;
    }
    Ok(())
}

fn apply_migration(conn: &Connection, version: &str, sql: &str) -> Result<()> {
    if is_migration_applied(conn, version)? {
        return Ok(());
    }

    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(sql)?;
    record_migration(&tx, version)?;
    tx.commit()?;

    Ok(())
}

fn is_migration_applied(conn: &Connection, version: &str) -> Result<bool> {
    let table_exists: bool = conn
        .prepare("SELECT name FROM sqlite_master WHERE type='table' AND name='schema_migrations'")?
        .exists([])?;

    if !table_exists {
        return Ok(false);
    }

    let exists = conn
        .prepare("SELECT 1 FROM schema_migrations WHERE version = ?")?
        .exists([version])?;

    Ok(exists)
}

fn record_migration(conn: &Connection, version: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO schema_migrations (version, applied_at) VALUES (?, CURRENT_TIMESTAMP)",
        [version],
    )?;
    Ok(())
}
