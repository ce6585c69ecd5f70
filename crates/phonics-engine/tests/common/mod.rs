//! Shared fixtures: in-memory database and collaborator doubles.

#![allow(dead_code)]

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tokio::sync::mpsc;

use phonics_engine::curriculum::{ContentItem, Curriculum};
use phonics_engine::db;
use phonics_engine::error::{AudioError, GenerateError, RecognizerError};
use phonics_engine::events::RecognitionEvent;
use phonics_engine::traits::{AudioPlayer, ContentGenerator, SpeechRecognizer};
use phonics_engine::{EngineConfig, LearningEngine};

/// Single-connection pool so the in-memory database is shared.
pub async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory pool");
    db::run_migrations(&pool).await.expect("migrations");
    pool
}

pub fn test_config() -> EngineConfig {
    EngineConfig {
        generator_base_backoff: Duration::from_millis(1),
        ..EngineConfig::default()
    }
}

pub async fn test_engine(pool: SqlitePool, config: EngineConfig) -> LearningEngine {
    LearningEngine::new(
        pool,
        Arc::new(Curriculum::starter()),
        Arc::new(ScriptedRecognizer::new()),
        Arc::new(MockPlayer::new()),
        None,
        config,
    )
}

/// Recognizer double replaying scripted event batches, one per `start`.
pub struct ScriptedRecognizer {
    scripts: Mutex<VecDeque<Vec<RecognitionEvent>>>,
    fail_starts: AtomicU32,
    starts: AtomicU32,
    listening: AtomicBool,
}

impl ScriptedRecognizer {
    pub fn new() -> Self {
        Self {
            scripts: Mutex::new(VecDeque::new()),
            fail_starts: AtomicU32::new(0),
            starts: AtomicU32::new(0),
            listening: AtomicBool::new(false),
        }
    }

    pub fn script(self, events: Vec<RecognitionEvent>) -> Self {
        self.scripts.lock().push_back(events);
        self
    }

    /// Make the next `count` start calls fail.
    pub fn failing_starts(self, count: u32) -> Self {
        self.fail_starts.store(count, Ordering::SeqCst);
        self
    }

    pub fn start_count(&self) -> u32 {
        self.starts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechRecognizer for ScriptedRecognizer {
    async fn start(
        &self,
        _locale: &str,
        events: mpsc::Sender<RecognitionEvent>,
    ) -> Result<(), RecognizerError> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        if self.fail_starts.load(Ordering::SeqCst) > 0 {
            self.fail_starts.fetch_sub(1, Ordering::SeqCst);
            return Err(RecognizerError::Unavailable("speech service down".into()));
        }
        self.listening.store(true, Ordering::SeqCst);
        if let Some(batch) = self.scripts.lock().pop_front() {
            tokio::spawn(async move {
                for event in batch {
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    if events.send(event).await.is_err() {
                        break;
                    }
                }
            });
        }
        Ok(())
    }

    async fn stop(&self) {
        self.listening.store(false, Ordering::SeqCst);
    }

    async fn is_listening(&self) -> bool {
        self.listening.load(Ordering::SeqCst)
    }
}

/// Player double recording plays and the capture flag.
pub struct MockPlayer {
    pub plays: Mutex<Vec<String>>,
    capture: AtomicBool,
}

impl MockPlayer {
    pub fn new() -> Self {
        Self {
            plays: Mutex::new(Vec::new()),
            capture: AtomicBool::new(false),
        }
    }

    pub fn capture_enabled(&self) -> bool {
        self.capture.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AudioPlayer for MockPlayer {
    async fn play(&self, asset: &str) -> Result<(), AudioError> {
        self.plays.lock().push(asset.to_string());
        Ok(())
    }

    async fn enable_capture(&self) {
        self.capture.store(true, Ordering::SeqCst);
    }

    async fn disable_capture(&self) {
        self.capture.store(false, Ordering::SeqCst);
    }
}

/// Generator double failing a fixed number of calls before succeeding.
pub struct FlakyGenerator {
    batch: Vec<ContentItem>,
    failures_left: AtomicU32,
    pub calls: AtomicU32,
}

impl FlakyGenerator {
    pub fn new(batch: Vec<ContentItem>, failures: u32) -> Self {
        Self {
            batch,
            failures_left: AtomicU32::new(failures),
            calls: AtomicU32::new(0),
        }
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentGenerator for FlakyGenerator {
    async fn generate(
        &self,
        _lesson: i64,
        _introduced: &HashSet<String>,
        exclude: &HashSet<String>,
    ) -> Result<Vec<ContentItem>, GenerateError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failures_left.load(Ordering::SeqCst) > 0 {
            self.failures_left.fetch_sub(1, Ordering::SeqCst);
            return Err(GenerateError::Unavailable("generation backend busy".into()));
        }
        Ok(self
            .batch
            .iter()
            .filter(|item| !exclude.contains(&item.key))
            .cloned()
            .collect())
    }
}
