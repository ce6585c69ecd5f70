use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::db::{format_timestamp, parse_timestamp};

/// Per-learner, per-item review state.
///
/// `repetitions` is the consecutive-success counter the scheduler feeds
/// back into interval growth; `attempts` and `successes` are cumulative
/// and only reported in stats.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulingRecord {
    pub id: String,
    pub learner_id: String,
    pub item_key: String,
    pub ease_factor: f64,
    pub interval_days: i64,
    pub repetitions: i64,
    pub next_due: DateTime<Utc>,
    pub attempts: i64,
    pub successes: i64,
    pub last_seen: Option<DateTime<Utc>>,
    pub needed_hint: bool,
}

impl SchedulingRecord {
    /// Fresh record for an item the learner has never practiced. Due
    /// immediately so it enters the next session's new-item fill.
    pub fn new(learner_id: &str, item_key: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            learner_id: learner_id.to_string(),
            item_key: item_key.to_string(),
            ease_factor: phonics_algo::INITIAL_EASE,
            interval_days: 0,
            repetitions: 0,
            next_due: now,
            attempts: 0,
            successes: 0,
            last_seen: None,
            needed_hint: false,
        }
    }
}

/// Aggregate progress numbers surfaced to the parent dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearnerStats {
    pub practiced_items: i64,
    pub total_attempts: i64,
    pub total_successes: i64,
    pub due_now: i64,
}

pub async fn get_record(
    pool: &SqlitePool,
    learner_id: &str,
    item_key: &str,
) -> Result<Option<SchedulingRecord>, sqlx::Error> {
    let row = sqlx::query(
        "SELECT * FROM scheduling_records WHERE learner_id = ? AND item_key = ? LIMIT 1",
    )
    .bind(learner_id)
    .bind(item_key)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(|r| map_record(&r)))
}

/// Records due at or before `now`, most overdue first.
pub async fn get_due_records(
    pool: &SqlitePool,
    learner_id: &str,
    now: DateTime<Utc>,
    limit: i64,
) -> Result<Vec<SchedulingRecord>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT * FROM scheduling_records
        WHERE learner_id = ? AND attempts > 0 AND next_due <= ?
        ORDER BY next_due ASC
        LIMIT ?
        "#,
    )
    .bind(learner_id)
    .bind(format_timestamp(now))
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows.iter().map(map_record).collect())
}

/// Last-write-wins upsert keyed on (learner_id, item_key).
pub async fn upsert_record(
    pool: &SqlitePool,
    record: &SchedulingRecord,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO scheduling_records
            (id, learner_id, item_key, ease_factor, interval_days, repetitions,
             next_due, attempts, successes, last_seen, needed_hint)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT (learner_id, item_key) DO UPDATE SET
            ease_factor   = excluded.ease_factor,
            interval_days = excluded.interval_days,
            repetitions   = excluded.repetitions,
            next_due      = excluded.next_due,
            attempts      = excluded.attempts,
            successes     = excluded.successes,
            last_seen     = excluded.last_seen,
            needed_hint   = excluded.needed_hint
        "#,
    )
    .bind(&record.id)
    .bind(&record.learner_id)
    .bind(&record.item_key)
    .bind(record.ease_factor)
    .bind(record.interval_days)
    .bind(record.repetitions)
    .bind(format_timestamp(record.next_due))
    .bind(record.attempts)
    .bind(record.successes)
    .bind(record.last_seen.map(format_timestamp))
    .bind(record.needed_hint as i64)
    .execute(pool)
    .await?;
    Ok(())
}

/// Keys of items the learner has attempted at least once.
pub async fn practiced_keys(
    pool: &SqlitePool,
    learner_id: &str,
) -> Result<HashSet<String>, sqlx::Error> {
    let rows = sqlx::query(
        "SELECT item_key FROM scheduling_records WHERE learner_id = ? AND attempts > 0",
    )
    .bind(learner_id)
    .fetch_all(pool)
    .await?;
    Ok(rows
        .iter()
        .map(|r| r.try_get("item_key").unwrap_or_default())
        .collect())
}

/// Keys practiced at or after `cutoff`, for the anti-repeat filter.
pub async fn recently_seen_keys(
    pool: &SqlitePool,
    learner_id: &str,
    cutoff: DateTime<Utc>,
) -> Result<HashSet<String>, sqlx::Error> {
    let rows = sqlx::query(
        "SELECT item_key FROM scheduling_records WHERE learner_id = ? AND last_seen >= ?",
    )
    .bind(learner_id)
    .bind(format_timestamp(cutoff))
    .fetch_all(pool)
    .await?;
    Ok(rows
        .iter()
        .map(|r| r.try_get("item_key").unwrap_or_default())
        .collect())
}

pub async fn learner_stats(
    pool: &SqlitePool,
    learner_id: &str,
    now: DateTime<Utc>,
) -> Result<LearnerStats, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT
            COUNT(CASE WHEN attempts > 0 THEN 1 END)              AS practiced_items,
            COALESCE(SUM(attempts), 0)                            AS total_attempts,
            COALESCE(SUM(successes), 0)                           AS total_successes,
            COUNT(CASE WHEN attempts > 0 AND next_due <= ? THEN 1 END) AS due_now
        FROM scheduling_records
        WHERE learner_id = ?
        "#,
    )
    .bind(format_timestamp(now))
    .bind(learner_id)
    .fetch_one(pool)
    .await?;

    Ok(LearnerStats {
        practiced_items: row.try_get("practiced_items").unwrap_or(0),
        total_attempts: row.try_get("total_attempts").unwrap_or(0),
        total_successes: row.try_get("total_successes").unwrap_or(0),
        due_now: row.try_get("due_now").unwrap_or(0),
    })
}

fn map_record(row: &sqlx::sqlite::SqliteRow) -> SchedulingRecord {
    let next_due_raw: String = row.try_get("next_due").unwrap_or_default();
    let last_seen_raw: Option<String> = row.try_get("last_seen").ok();
    let needed_hint: i64 = row.try_get("needed_hint").unwrap_or(0);
    SchedulingRecord {
        id: row.try_get("id").unwrap_or_default(),
        learner_id: row.try_get("learner_id").unwrap_or_default(),
        item_key: row.try_get("item_key").unwrap_or_default(),
        ease_factor: row.try_get("ease_factor").unwrap_or(phonics_algo::INITIAL_EASE),
        interval_days: row.try_get("interval_days").unwrap_or(0),
        repetitions: row.try_get("repetitions").unwrap_or(0),
        next_due: parse_timestamp(&next_due_raw),
        attempts: row.try_get("attempts").unwrap_or(0),
        successes: row.try_get("successes").unwrap_or(0),
        last_seen: last_seen_raw.as_deref().map(parse_timestamp),
        needed_hint: needed_hint != 0,
    }
}
