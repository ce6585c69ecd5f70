use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};

use crate::db::{format_timestamp, parse_timestamp};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Learner {
    pub id: String,
    pub current_lesson: i64,
    pub total_completed: i64,
    pub created_at: DateTime<Utc>,
}

/// Idempotent: an existing learner is left untouched.
pub async fn ensure_learner(pool: &SqlitePool, learner_id: &str) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO learners (id, current_lesson, total_completed, created_at)
        VALUES (?, 1, 0, ?)
        ON CONFLICT (id) DO NOTHING
        "#,
    )
    .bind(learner_id)
    .bind(format_timestamp(Utc::now()))
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn get_learner(
    pool: &SqlitePool,
    learner_id: &str,
) -> Result<Option<Learner>, sqlx::Error> {
    let row = sqlx::query("SELECT * FROM learners WHERE id = ? LIMIT 1")
        .bind(learner_id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|r| map_learner(&r)))
}

pub async fn set_current_lesson(
    pool: &SqlitePool,
    learner_id: &str,
    lesson: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE learners SET current_lesson = ? WHERE id = ?")
        .bind(lesson)
        .bind(learner_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn increment_total_completed(
    pool: &SqlitePool,
    learner_id: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE learners SET total_completed = total_completed + 1 WHERE id = ?")
        .bind(learner_id)
        .execute(pool)
        .await?;
    Ok(())
}

fn map_learner(row: &sqlx::sqlite::SqliteRow) -> Learner {
    let created_raw: String = row.try_get("created_at").unwrap_or_default();
    Learner {
        id: row.try_get("id").unwrap_or_default(),
        current_lesson: row.try_get("current_lesson").unwrap_or(1),
        total_completed: row.try_get("total_completed").unwrap_or(0),
        created_at: parse_timestamp(&created_raw),
    }
}
