mod common;

use chrono::{Duration, Utc};
use proptest::prelude::*;

use phonics_engine::db::operations::units;
use phonics_engine::{EngineError, EpisodeOutcome};

use common::{test_config, test_engine, test_pool};

fn success(attempts: u32) -> EpisodeOutcome {
    EpisodeOutcome {
        success: true,
        attempts,
        match_score: 0.9,
        needed_help: false,
    }
}

fn failure() -> EpisodeOutcome {
    EpisodeOutcome {
        success: false,
        attempts: 3,
        match_score: 0.0,
        needed_help: false,
    }
}

#[tokio::test]
async fn first_practice_synthesizes_a_record() {
    let pool = test_pool().await;
    let engine = test_engine(pool, test_config()).await;
    engine.ensure_learner("kid-1").await.unwrap();

    let record = engine
        .record_outcome("kid-1", "word:sat", success(1))
        .await
        .unwrap();

    assert_eq!(record.repetitions, 1);
    assert_eq!(record.interval_days, 1);
    assert_eq!(record.attempts, 1);
    assert_eq!(record.successes, 1);
    assert!((record.ease_factor - 2.6).abs() < 1e-9);
    assert!(record.next_due > Utc::now());
    assert!(record.next_due <= Utc::now() + Duration::days(1));
}

#[tokio::test]
async fn interval_ladder_grows_then_resets_on_failure() {
    let pool = test_pool().await;
    let engine = test_engine(pool, test_config()).await;
    engine.ensure_learner("kid-1").await.unwrap();

    let first = engine
        .record_outcome("kid-1", "word:tap", success(1))
        .await
        .unwrap();
    assert_eq!(first.interval_days, 1);

    let second = engine
        .record_outcome("kid-1", "word:tap", success(1))
        .await
        .unwrap();
    assert_eq!(second.interval_days, 3);
    assert_eq!(second.repetitions, 2);

    let third = engine
        .record_outcome("kid-1", "word:tap", success(1))
        .await
        .unwrap();
    // round(3 * ease) with ease at 2.8 by now.
    assert_eq!(third.interval_days, 8);

    let failed = engine
        .record_outcome("kid-1", "word:tap", failure())
        .await
        .unwrap();
    assert_eq!(failed.interval_days, 1);
    assert_eq!(failed.repetitions, 0);
    assert!(failed.ease_factor < third.ease_factor);
    assert_eq!(failed.attempts, third.attempts + 3);
}

#[tokio::test]
async fn unit_outcomes_introduce_units_and_advance_the_lesson() {
    let pool = test_pool().await;
    let engine = test_engine(pool.clone(), test_config()).await;
    engine.ensure_learner("kid-1").await.unwrap();
    assert_eq!(engine.get_learner("kid-1").await.unwrap().current_lesson, 1);

    for unit in ["s", "a", "t"] {
        engine
            .record_outcome("kid-1", &format!("unit:{unit}"), success(1))
            .await
            .unwrap();
    }
    // One unit still missing.
    assert_eq!(engine.get_learner("kid-1").await.unwrap().current_lesson, 1);

    engine
        .record_outcome("kid-1", "unit:p", success(1))
        .await
        .unwrap();
    let learner = engine.get_learner("kid-1").await.unwrap();
    assert_eq!(learner.current_lesson, 2);
    assert_eq!(learner.total_completed, 4);

    let introduced = units::introduced_units(&pool, "kid-1").await.unwrap();
    assert_eq!(introduced.len(), 4);
}

#[tokio::test]
async fn unit_introduction_keeps_the_first_timestamp() {
    let pool = test_pool().await;
    let now = Utc::now();
    let later = now + Duration::hours(1);

    assert!(units::introduce_unit(&pool, "kid-1", "s", now).await.unwrap());
    assert!(!units::introduce_unit(&pool, "kid-1", "s", later).await.unwrap());

    let stamp = units::introduced_at(&pool, "kid-1", "s").await.unwrap();
    let again = units::introduced_at(&pool, "kid-1", "s").await.unwrap();
    assert_eq!(stamp, again);
    assert!(stamp.unwrap().starts_with(&now.format("%Y-%m-%dT%H").to_string()));
}

#[tokio::test]
async fn unknown_item_and_learner_are_errors() {
    let pool = test_pool().await;
    let engine = test_engine(pool, test_config()).await;
    engine.ensure_learner("kid-1").await.unwrap();

    let err = engine
        .record_outcome("kid-1", "word:zebra", success(1))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::UnknownItem(_)));

    let err = engine
        .record_outcome("nobody", "word:sat", success(1))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::UnknownLearner(_)));
}

#[tokio::test]
async fn stats_aggregate_over_records() {
    let pool = test_pool().await;
    let engine = test_engine(pool, test_config()).await;
    engine.ensure_learner("kid-1").await.unwrap();

    engine
        .record_outcome("kid-1", "word:sat", success(1))
        .await
        .unwrap();
    engine
        .record_outcome("kid-1", "word:tap", failure())
        .await
        .unwrap();

    let stats = engine.stats("kid-1").await.unwrap();
    assert_eq!(stats.practiced_items, 2);
    assert_eq!(stats.total_attempts, 4);
    assert_eq!(stats.total_successes, 1);
    // Both items rescheduled a day out, nothing due yet.
    assert_eq!(stats.due_now, 0);
}

#[tokio::test]
async fn ensure_learner_is_idempotent() {
    let pool = test_pool().await;
    let engine = test_engine(pool, test_config()).await;
    engine.ensure_learner("kid-1").await.unwrap();
    engine
        .record_outcome("kid-1", "word:sat", success(1))
        .await
        .unwrap();

    engine.ensure_learner("kid-1").await.unwrap();
    let learner = engine.get_learner("kid-1").await.unwrap();
    assert_eq!(learner.total_completed, 1);
}

#[tokio::test]
async fn connect_creates_schema_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("progress.db");
    let url = format!("sqlite://{}", path.display());

    let pool = phonics_engine::db::connect(&url).await.unwrap();
    let engine = test_engine(pool, test_config()).await;
    engine.ensure_learner("kid-1").await.unwrap();
    engine
        .record_outcome("kid-1", "word:sat", success(1))
        .await
        .unwrap();

    assert!(path.exists());
    assert_eq!(engine.stats("kid-1").await.unwrap().practiced_items, 1);
}

proptest! {
    // Derived quality agrees with the reported outcome on the pass line.
    #[test]
    fn quality_tracks_success(
        success in any::<bool>(),
        attempts in 1u32..10,
        needed_help in any::<bool>(),
    ) {
        let outcome = EpisodeOutcome {
            success,
            attempts,
            match_score: 0.0,
            needed_help,
        };
        let quality = outcome.quality();
        prop_assert!(quality.value() <= 5);
        prop_assert_eq!(quality.is_success(), success);
    }
}
