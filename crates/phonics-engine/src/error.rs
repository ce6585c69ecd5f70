#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Unknown learner: {0}")]
    UnknownLearner(String),
    #[error("Unknown content item: {0}")]
    UnknownItem(String),
    #[error("Lesson {0} is outside the curriculum")]
    LessonOutOfRange(i64),
}

/// Failure from the external content generator. Always retried with
/// backoff by the session builder; exhaustion shortens the session
/// instead of propagating.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("Generator unavailable: {0}")]
    Unavailable(String),
    #[error("Generation failed: {0}")]
    Failed(String),
}

/// Audio playback failure. Episodes log it and proceed; a silent prompt
/// still reaches the listening phase.
#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("Playback failed: {0}")]
    Playback(String),
}

/// Failure from the external speech recognizer. Never learner-visible:
/// the episode state machine degrades to fallback instead.
#[derive(Debug, thiserror::Error)]
pub enum RecognizerError {
    #[error("Recognizer unavailable: {0}")]
    Unavailable(String),
    #[error("Recognizer error: {0}")]
    Engine(String),
}
