//! Engine facade tying scheduling, progression, sessions, and episodes
//! together behind one handle the host embeds.

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tokio::sync::mpsc;
use tracing::info;

use phonics_algo::{update_schedule, Quality, ScheduleState};

use crate::config::EngineConfig;
use crate::curriculum::{ContentItem, ContentKind};
use crate::db::operations::{learner, scheduling, units};
use crate::db::operations::learner::Learner;
use crate::db::operations::scheduling::{LearnerStats, SchedulingRecord};
use crate::error::EngineError;
use crate::events::EpisodeEvent;
use crate::session::{PrefetchHandle, SessionBuilder, SessionItem};
use crate::speech::{start_episode, EpisodeHandle, EpisodeSpec};
use crate::traits::{AudioPlayer, ContentGenerator, ContentStore, SpeechRecognizer};

/// Result of one completed practice episode, as reported by the host.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeOutcome {
    pub success: bool,
    /// Utterance attempts within the episode, at least 1.
    pub attempts: u32,
    /// Matcher confidence of the accepted utterance, 0.0 when none.
    pub match_score: f64,
    pub needed_help: bool,
}

impl EpisodeOutcome {
    /// Derive the 0..=5 recall rating the scheduler consumes.
    pub fn quality(&self) -> Quality {
        let q = if self.success {
            if self.attempts <= 1 && !self.needed_help {
                5
            } else if self.attempts <= 2 && !self.needed_help {
                4
            } else {
                3
            }
        } else if self.needed_help {
            1
        } else {
            2
        };
        Quality::new(q)
    }
}

/// Per-episode options for [`LearningEngine::start_episode`].
#[derive(Debug, Clone, Default)]
pub struct EpisodeOptions {
    /// Bypass the speech check entirely (parental setting, muted device).
    pub skip_speech: bool,
    /// Prompt asset override; defaults to the item's canonical prompt.
    pub prompt_asset: Option<String>,
}

pub struct LearningEngine {
    pool: SqlitePool,
    store: Arc<dyn ContentStore>,
    recognizer: Arc<dyn SpeechRecognizer>,
    player: Arc<dyn AudioPlayer>,
    sessions: SessionBuilder,
    config: EngineConfig,
}

impl LearningEngine {
    pub fn new(
        pool: SqlitePool,
        store: Arc<dyn ContentStore>,
        recognizer: Arc<dyn SpeechRecognizer>,
        player: Arc<dyn AudioPlayer>,
        generator: Option<Arc<dyn ContentGenerator>>,
        config: EngineConfig,
    ) -> Self {
        let sessions = SessionBuilder::new(
            pool.clone(),
            Arc::clone(&store),
            generator,
            config.clone(),
        );
        Self {
            pool,
            store,
            recognizer,
            player,
            sessions,
            config,
        }
    }

    /// Create the learner row if absent; existing progress is untouched.
    pub async fn ensure_learner(&self, learner_id: &str) -> Result<(), EngineError> {
        learner::ensure_learner(&self.pool, learner_id).await?;
        Ok(())
    }

    pub async fn get_learner(&self, learner_id: &str) -> Result<Learner, EngineError> {
        learner::get_learner(&self.pool, learner_id)
            .await?
            .ok_or_else(|| EngineError::UnknownLearner(learner_id.to_string()))
    }

    pub async fn build_session(&self, learner_id: &str) -> Result<Vec<SessionItem>, EngineError> {
        self.sessions.build_session(learner_id).await
    }

    /// Start a speech episode for `item`. The returned handle controls the
    /// episode; events stream on the receiver.
    pub fn start_episode(
        &self,
        item: &ContentItem,
        options: EpisodeOptions,
    ) -> (EpisodeHandle, mpsc::Receiver<EpisodeEvent>) {
        let prompt_asset = options
            .prompt_asset
            .unwrap_or_else(|| format!("prompts/{}.mp3", item.key.replace(':', "_")));
        let spec = EpisodeSpec {
            target: item.text.clone(),
            prompt_asset,
            skip_speech: options.skip_speech,
        };
        start_episode(
            spec,
            Arc::clone(&self.recognizer),
            Arc::clone(&self.player),
            self.config.clone(),
        )
    }

    /// Resolve the next session item in the background.
    pub fn prefetch(&self, item_key: &str) -> PrefetchHandle {
        self.sessions.prefetch(item_key)
    }

    /// Persist one episode outcome: update the review schedule, bump the
    /// completion counter, record unit introductions, advance the lesson
    /// when its units are all introduced.
    pub async fn record_outcome(
        &self,
        learner_id: &str,
        item_key: &str,
        outcome: EpisodeOutcome,
    ) -> Result<SchedulingRecord, EngineError> {
        let item = self
            .store
            .get(item_key)
            .await
            .ok_or_else(|| EngineError::UnknownItem(item_key.to_string()))?;
        // Learner must exist before progress lands on it.
        let _ = self.get_learner(learner_id).await?;

        let now = Utc::now();
        // First practice of an item synthesizes its record.
        let mut record = scheduling::get_record(&self.pool, learner_id, item_key)
            .await?
            .unwrap_or_else(|| SchedulingRecord::new(learner_id, item_key, now));

        let quality = outcome.quality();
        let previous = ScheduleState {
            ease_factor: record.ease_factor,
            interval_days: record.interval_days,
            repetitions: record.repetitions as i32,
        };
        let next = update_schedule(Some(&previous), quality);

        record.ease_factor = next.ease_factor;
        record.interval_days = next.interval_days;
        record.repetitions = next.repetitions as i64;
        record.next_due = now + Duration::days(next.interval_days);
        record.attempts += outcome.attempts.max(1) as i64;
        record.successes += outcome.success as i64;
        record.last_seen = Some(now);
        record.needed_hint = outcome.needed_help;

        scheduling::upsert_record(&self.pool, &record).await?;
        learner::increment_total_completed(&self.pool, learner_id).await?;

        if item.kind == ContentKind::Unit {
            for unit in &item.units {
                units::introduce_unit(&self.pool, learner_id, unit, now).await?;
            }
        }

        self.advance_lesson_if_ready(learner_id).await?;

        info!(
            learner_id = %learner_id,
            item_key = %item_key,
            quality = quality.value(),
            interval_days = record.interval_days,
            "Outcome recorded"
        );
        Ok(record)
    }

    /// Advance the learner one lesson when the current lesson's units are
    /// all introduced. Idempotent; never advances past the curriculum end.
    pub async fn advance_lesson_if_ready(&self, learner_id: &str) -> Result<bool, EngineError> {
        let current = self.get_learner(learner_id).await?;
        if current.current_lesson >= self.store.lesson_count().await {
            return Ok(false);
        }
        let introduced = units::introduced_units(&self.pool, learner_id).await?;
        let pending = self
            .store
            .pending_units(current.current_lesson, &introduced)
            .await;
        if !pending.is_empty() {
            return Ok(false);
        }
        let next = current.current_lesson + 1;
        learner::set_current_lesson(&self.pool, learner_id, next).await?;
        info!(learner_id = %learner_id, lesson = next, "Lesson advanced");
        Ok(true)
    }

    pub async fn stats(&self, learner_id: &str) -> Result<LearnerStats, EngineError> {
        let _ = self.get_learner(learner_id).await?;
        let stats = scheduling::learner_stats(&self.pool, learner_id, Utc::now()).await?;
        Ok(stats)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
