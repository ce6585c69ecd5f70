//! # phonics-engine
//!
//! Adaptive learning session engine for early readers. The engine owns:
//!
//! - curriculum unlock state (which phonetic units a learner has met)
//! - spaced-repetition scheduling records and due queries
//! - session assembly (due reviews first, then newly unlocked content)
//! - the speech-checked practice episode state machine
//!
//! Rendering, audio playback and speech recognition live outside the
//! engine; they are injected through the traits in [`traits`]. A failure
//! in any collaborator degrades the episode or shortens the session, it
//! never surfaces to the learner as an error.

pub mod config;
pub mod curriculum;
pub mod db;
pub mod engine;
pub mod error;
pub mod events;
pub mod logging;
pub mod session;
pub mod speech;
pub mod traits;

pub use config::EngineConfig;
pub use engine::{EpisodeOptions, EpisodeOutcome, LearningEngine};
pub use error::EngineError;
pub use speech::{EpisodeHandle, EpisodeState};
