//! Database migrations for the case/prediction/feedback/retraining tables.
//!
//! Follows the teacher's `Migration { version, description, up }` const-array
//! pattern: each entry is a plain SQL batch applied once, tracked in
//! `schema_version`.

/// Migration definitions.
pub const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    description: "Initial schema: cases, predictions, feedback, retraining",
    up: MIGRATION_V1_UP,
}];

/// A database migration.
#[derive(Debug, Clone)]
pub struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub up: &'static str,
}

/// V1: case corpus (C2) + learning subsystem (C7) tables, per spec.md §3.
const MIGRATION_V1_UP: &str = r#"
CREATE TABLE IF NOT EXISTS cases (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    text TEXT NOT NULL,
    condition TEXT NOT NULL,
    severity TEXT NOT NULL,
    source TEXT NOT NULL DEFAULT 'seed',
    verified INTEGER NOT NULL DEFAULT 0,
    origin_confidence REAL,
    embedding BLOB NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_cases_condition ON cases(condition);

CREATE TABLE IF NOT EXISTS predictions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    incident_id INTEGER,
    user_text TEXT NOT NULL,
    predicted_condition TEXT NOT NULL,
    predicted_severity TEXT NOT NULL,
    confidence REAL NOT NULL,
    sources_used TEXT NOT NULL,
    vector_match TEXT,
    graph_match TEXT,
    llm_match TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_predictions_incident ON predictions(incident_id);
CREATE INDEX IF NOT EXISTS idx_predictions_created ON predictions(created_at);

CREATE TABLE IF NOT EXISTS feedback (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    prediction_id INTEGER NOT NULL UNIQUE REFERENCES predictions(id),
    was_correct INTEGER NOT NULL,
    actual_condition TEXT NOT NULL,
    actual_severity TEXT NOT NULL,
    notes TEXT,
    verified_by TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS retraining (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    prediction_id INTEGER REFERENCES predictions(id),
    user_text TEXT NOT NULL,
    correct_condition TEXT NOT NULL,
    correct_severity TEXT NOT NULL,
    origin_incident INTEGER,
    added_at TEXT NOT NULL,
    consumed_at TEXT
);

CREATE INDEX IF NOT EXISTS idx_retraining_consumed ON retraining(consumed_at);
CREATE INDEX IF NOT EXISTS idx_retraining_prediction ON retraining(prediction_id);

CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL
);

INSERT OR IGNORE INTO schema_version (version, applied_at) VALUES (1, datetime('now'));
"#;

fn get_current_version(conn: &rusqlite::Connection) -> rusqlite::Result<u32> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL
        );",
    )?;
    let version: Option<u32> = conn
        .query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))
        .unwrap_or(None);
    Ok(version.unwrap_or(0))
}

/// Apply every migration newer than the database's current version.
pub fn apply_migrations(conn: &rusqlite::Connection) -> rusqlite::Result<u32> {
    let current_version = get_current_version(conn)?;
    let mut applied = 0;

    for migration in MIGRATIONS {
        if migration.version > current_version {
            tracing::info!(
                "Applying migration v{}: {}",
                migration.version,
                migration.description
            );
            conn.execute_batch(migration.up)?;
            applied += 1;
        }
    }

    Ok(applied)
}
