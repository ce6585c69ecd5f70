use serde::{Deserialize, Serialize};

use crate::speech::EpisodeState;

/// One streaming event from the external speech recognizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum RecognitionEvent {
    #[serde(rename = "PARTIAL")]
    Partial(String),

    #[serde(rename = "FINAL")]
    Final(String),

    #[serde(rename = "NO_INPUT")]
    NoInput,

    #[serde(rename = "ERROR")]
    Error(String),
}

/// Notification emitted by a running episode for the surrounding UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum EpisodeEvent {
    #[serde(rename = "STATE_CHANGED")]
    StateChanged(EpisodeState),

    /// Utterance matched the target; the episode is complete.
    #[serde(rename = "MATCHED")]
    Matched { confidence: f64 },

    /// Utterance recognized but not accepted; text surfaced for UI feedback.
    #[serde(rename = "INCORRECT")]
    Incorrect { recognized: String, attempts: u32 },

    /// Recognizer delivered an empty result.
    #[serde(rename = "NO_INPUT")]
    NoInput,

    /// Speech check bypassed; manual completion is accepted unconditionally.
    #[serde(rename = "FALLBACK")]
    Fallback { reason: FallbackReason },

    /// The two-swipe override fired; the episode counts as satisfied.
    #[serde(rename = "SWIPE_COMPLETABLE")]
    SwipeCompletable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FallbackReason {
    SpeechSkipped,
    RecognizerUnavailable,
    EpisodeTimeout,
    RestartBudgetExhausted,
}
