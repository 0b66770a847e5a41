use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::Connection;

pub fn open_connection(db_path: &Path) -> Result<Connection> {
    Connection::open(db_path).with_context(|| format!("failed to open db: {}", db_path.display()))
}

/// Create the `arks` table when a fresh database is used.
pub fn init_db(db_path: &Path) -> Result<()> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create parent dir: {}", parent.display()))?;
    }

    let conn = open_connection(db_path)?;

    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS arks (
            id                  INTEGER PRIMARY KEY AUTOINCREMENT,
            ark                 TEXT NOT NULL,
            original_identifier TEXT,
            project             TEXT,
            url                 TEXT,
            path                TEXT,
            valid               INTEGER,
            validation_date     TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_arks_ark ON arks(ark);
        CREATE INDEX IF NOT EXISTS idx_arks_project ON arks(project);
        ",
    )
    .context("failed to initialize schema")?;

    Ok(())
}
