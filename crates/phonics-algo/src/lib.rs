//! # phonics-algo
//!
//! Pure algorithms for an early-reader phonics trainer:
//!
//! - **SM-2 scheduler** - spaced-repetition interval and ease updates
//! - **Pronunciation matcher** - fuzzy comparison of recognized child
//!   speech against a target word or sentence
//!
//! Both are deterministic, side-effect free and clock free. Callers own
//! persistence and timestamps; this crate only computes the next state.

pub mod matcher;
pub mod sm2;
pub mod types;

pub use matcher::{match_pronunciation, normalize_text, MatchOutcome};
pub use sm2::update_schedule;
pub use types::{Quality, ScheduleState, EASE_FLOOR, INITIAL_EASE};
