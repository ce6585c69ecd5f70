//! Session assembly: due reviews first, then fresh material.
//!
//! A session is at most `session_size` items. Due records come first in
//! due order; the remainder is filled with never-practiced unlocked items
//! in curriculum order, auto-introducing the current lesson's units when
//! the fill runs short. An optional generator tops up after the curriculum
//! is exhausted. A short session is a valid session.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::curriculum::ContentItem;
use crate::db::operations::{learner, scheduling, units};
use crate::error::EngineError;
use crate::traits::{ContentGenerator, ContentStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemSource {
    Due,
    New,
    Generated,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionItem {
    pub item: ContentItem,
    pub source: ItemSource,
}

pub struct SessionBuilder {
    pool: SqlitePool,
    store: Arc<dyn ContentStore>,
    generator: Option<Arc<dyn ContentGenerator>>,
    config: EngineConfig,
}

impl SessionBuilder {
    pub fn new(
        pool: SqlitePool,
        store: Arc<dyn ContentStore>,
        generator: Option<Arc<dyn ContentGenerator>>,
        config: EngineConfig,
    ) -> Self {
        Self {
            pool,
            store,
            generator,
            config,
        }
    }

    /// Assemble the next practice session for `learner_id`.
    pub async fn build_session(
        &self,
        learner_id: &str,
    ) -> Result<Vec<SessionItem>, EngineError> {
        let learner = learner::get_learner(&self.pool, learner_id)
            .await?
            .ok_or_else(|| EngineError::UnknownLearner(learner_id.to_string()))?;

        let now = Utc::now();
        let capacity = self.config.session_size;
        let mut session: Vec<SessionItem> = Vec::with_capacity(capacity);
        let mut taken: HashSet<String> = HashSet::new();

        for record in
            scheduling::get_due_records(&self.pool, learner_id, now, capacity as i64).await?
        {
            match self.store.get(&record.item_key).await {
                Some(item) => {
                    taken.insert(item.key.clone());
                    session.push(SessionItem {
                        item,
                        source: ItemSource::Due,
                    });
                }
                None => {
                    warn!(item_key = %record.item_key, "Due record has no content item, skipping");
                }
            }
        }

        let mut introduced = units::introduced_units(&self.pool, learner_id).await?;
        let practiced = scheduling::practiced_keys(&self.pool, learner_id).await?;
        let cutoff = now
            - chrono::Duration::from_std(self.config.anti_repeat_window)
                .unwrap_or_else(|_| chrono::Duration::seconds(5));
        let recent = scheduling::recently_seen_keys(&self.pool, learner_id, cutoff).await?;

        // Fill with new material, introducing units one at a time until the
        // session is full or the lesson has nothing left to introduce.
        loop {
            let unlocked = self
                .store
                .unlocked_items(learner.current_lesson, &introduced)
                .await;
            for item in unlocked {
                if session.len() >= capacity {
                    break;
                }
                if taken.contains(&item.key)
                    || practiced.contains(&item.key)
                    || recent.contains(&item.key)
                {
                    continue;
                }
                taken.insert(item.key.clone());
                session.push(SessionItem {
                    item,
                    source: ItemSource::New,
                });
            }

            if session.len() >= capacity {
                break;
            }

            let pending = self
                .store
                .pending_units(learner.current_lesson, &introduced)
                .await;
            match pending.first() {
                Some(unit) => {
                    units::introduce_unit(&self.pool, learner_id, unit, now).await?;
                    info!(learner_id = %learner_id, unit = %unit, "Introduced phonetic unit");
                    introduced.insert(unit.clone());
                }
                None => break,
            }
        }

        if session.len() < capacity {
            if let Some(generator) = &self.generator {
                let mut exclude: HashSet<String> = practiced.clone();
                exclude.extend(taken.iter().cloned());
                exclude.extend(recent.iter().cloned());
                let generated = self
                    .generate_with_retry(generator.as_ref(), learner.current_lesson, &introduced, &exclude)
                    .await;
                for item in generated {
                    if session.len() >= capacity {
                        break;
                    }
                    if taken.contains(&item.key) {
                        continue;
                    }
                    taken.insert(item.key.clone());
                    session.push(SessionItem {
                        item,
                        source: ItemSource::Generated,
                    });
                }
            }
        }

        info!(
            learner_id = %learner_id,
            lesson = learner.current_lesson,
            items = session.len(),
            "Session built"
        );
        Ok(session)
    }

    /// Call the generator with bounded exponential backoff. Exhaustion
    /// returns an empty batch; the session just comes up short.
    async fn generate_with_retry(
        &self,
        generator: &dyn ContentGenerator,
        lesson: i64,
        introduced: &HashSet<String>,
        exclude: &HashSet<String>,
    ) -> Vec<ContentItem> {
        let max_attempts = self.config.generator_max_retries.max(1);
        for attempt in 0..max_attempts {
            match generator.generate(lesson, introduced, exclude).await {
                Ok(items) => return items,
                Err(err) => {
                    warn!(attempt = attempt + 1, error = %err, "Content generation failed");
                    if attempt + 1 < max_attempts {
                        let backoff = self.config.generator_base_backoff * (1u32 << attempt);
                        tokio::time::sleep(backoff).await;
                    }
                }
            }
        }
        debug!("Content generation exhausted retries, continuing without");
        Vec::new()
    }

    /// Resolve the next item in the background while an episode runs.
    pub fn prefetch(&self, item_key: &str) -> PrefetchHandle {
        let store = Arc::clone(&self.store);
        let key = item_key.to_string();
        let handle = tokio::spawn(async move { store.get(&key).await });
        PrefetchHandle {
            handle: Some(handle),
        }
    }
}

/// Cancellable background lookup. Dropping the handle aborts the task.
pub struct PrefetchHandle {
    handle: Option<JoinHandle<Option<ContentItem>>>,
}

impl PrefetchHandle {
    pub async fn resolve(mut self) -> Option<ContentItem> {
        let handle = self.handle.take()?;
        handle.await.ok().flatten()
    }
}

impl Drop for PrefetchHandle {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
