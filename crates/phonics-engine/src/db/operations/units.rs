use std::collections::HashSet;

use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

use crate::db::format_timestamp;

/// Record that `unit_id` has been introduced to the learner. Replays keep
/// the original timestamp; returns true only on first introduction.
pub async fn introduce_unit(
    pool: &SqlitePool,
    learner_id: &str,
    unit_id: &str,
    now: DateTime<Utc>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO introduced_units (learner_id, unit_id, introduced_at)
        VALUES (?, ?, ?)
        ON CONFLICT (learner_id, unit_id) DO NOTHING
        "#,
    )
    .bind(learner_id)
    .bind(unit_id)
    .bind(format_timestamp(now))
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn introduced_units(
    pool: &SqlitePool,
    learner_id: &str,
) -> Result<HashSet<String>, sqlx::Error> {
    let rows = sqlx::query("SELECT unit_id FROM introduced_units WHERE learner_id = ?")
        .bind(learner_id)
        .fetch_all(pool)
        .await?;
    Ok(rows
        .iter()
        .map(|r| r.try_get("unit_id").unwrap_or_default())
        .collect())
}

pub async fn introduced_at(
    pool: &SqlitePool,
    learner_id: &str,
    unit_id: &str,
) -> Result<Option<String>, sqlx::Error> {
    let row = sqlx::query(
        "SELECT introduced_at FROM introduced_units WHERE learner_id = ? AND unit_id = ? LIMIT 1",
    )
    .bind(learner_id)
    .bind(unit_id)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(|r| r.try_get("introduced_at").unwrap_or_default()))
}
