//! SQLite persistence for learner progress.
//!
//! Timestamps are stored as RFC 3339 TEXT so ordering comparisons can be
//! done directly in SQL. All writes are last-write-wins upserts keyed on
//! the natural key; unit introductions are insert-or-ignore so replays
//! keep the original timestamp.

pub mod operations;

use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS learners (
    id              TEXT PRIMARY KEY,
    current_lesson  INTEGER NOT NULL DEFAULT 1,
    total_completed INTEGER NOT NULL DEFAULT 0,
    created_at      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS scheduling_records (
    id             TEXT PRIMARY KEY,
    learner_id     TEXT NOT NULL,
    item_key       TEXT NOT NULL,
    ease_factor    REAL NOT NULL DEFAULT 2.5,
    interval_days  INTEGER NOT NULL DEFAULT 0,
    repetitions    INTEGER NOT NULL DEFAULT 0,
    next_due       TEXT NOT NULL,
    attempts       INTEGER NOT NULL DEFAULT 0,
    successes      INTEGER NOT NULL DEFAULT 0,
    last_seen      TEXT,
    needed_hint    INTEGER NOT NULL DEFAULT 0,
    UNIQUE (learner_id, item_key)
);

CREATE INDEX IF NOT EXISTS idx_scheduling_due
    ON scheduling_records (learner_id, next_due);

CREATE TABLE IF NOT EXISTS introduced_units (
    learner_id    TEXT NOT NULL,
    unit_id       TEXT NOT NULL,
    introduced_at TEXT NOT NULL,
    PRIMARY KEY (learner_id, unit_id)
);
"#;

/// Open a pool and ensure the schema exists.
pub async fn connect(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options: SqliteConnectOptions = database_url.parse::<SqliteConnectOptions>()?
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(5))
        .connect_with(options)
        .await?;

    run_migrations(&pool).await?;
    info!(url = %database_url, "Database ready");
    Ok(pool)
}

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for statement in SCHEMA.split(';').map(str::trim).filter(|s| !s.is_empty()) {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}

pub(crate) fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
