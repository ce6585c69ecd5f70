//! Collaborator seams for the host platform.
//!
//! The engine never talks to a speech stack, audio device, or content
//! backend directly; hosts plug implementations in behind these traits
//! and tests substitute doubles.

use std::collections::HashSet;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::curriculum::{ContentItem, Curriculum, UnlockEngine};
use crate::error::{AudioError, GenerateError, RecognizerError};
use crate::events::RecognitionEvent;

/// Read access to practice content. The built-in [`Curriculum`] satisfies
/// this; hosts with server-delivered content bring their own store.
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn get(&self, item_key: &str) -> Option<ContentItem>;

    /// Items from lesson 1 through `lesson` whose decomposition is fully
    /// covered by `introduced`, in presentation order.
    async fn unlocked_items(
        &self,
        lesson: i64,
        introduced: &HashSet<String>,
    ) -> Vec<ContentItem>;

    /// Units of `lesson` not yet in `introduced`, in presentation order.
    async fn pending_units(&self, lesson: i64, introduced: &HashSet<String>) -> Vec<String>;

    async fn lesson_count(&self) -> i64;
}

#[async_trait]
impl ContentStore for Curriculum {
    async fn get(&self, item_key: &str) -> Option<ContentItem> {
        Curriculum::get(self, item_key).cloned()
    }

    async fn unlocked_items(
        &self,
        lesson: i64,
        introduced: &HashSet<String>,
    ) -> Vec<ContentItem> {
        UnlockEngine::new(self)
            .unlocked_items(lesson, introduced)
            .into_iter()
            .cloned()
            .collect()
    }

    async fn pending_units(&self, lesson: i64, introduced: &HashSet<String>) -> Vec<String> {
        UnlockEngine::new(self).pending_units(lesson, introduced)
    }

    async fn lesson_count(&self) -> i64 {
        Curriculum::lesson_count(self)
    }
}

/// Optional dynamic content source. Failures are retried with backoff by
/// the session builder and never surface to the learner.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Produce fresh items for `lesson` restricted to `introduced` units,
    /// avoiding keys in `exclude`.
    async fn generate(
        &self,
        lesson: i64,
        introduced: &HashSet<String>,
        exclude: &HashSet<String>,
    ) -> Result<Vec<ContentItem>, GenerateError>;
}

/// Streaming speech recognition. Events arrive on the channel handed to
/// `start`; a session may deliver any number of partials before a final.
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    async fn start(
        &self,
        locale: &str,
        events: mpsc::Sender<RecognitionEvent>,
    ) -> Result<(), RecognizerError>;

    async fn stop(&self);

    /// Liveness probe used by the episode watchdog.
    async fn is_listening(&self) -> bool;
}

/// Prompt and feedback playback plus microphone capture control.
/// Playback and capture are mutually exclusive on the device.
#[async_trait]
pub trait AudioPlayer: Send + Sync {
    async fn play(&self, asset: &str) -> Result<(), AudioError>;
    async fn enable_capture(&self);
    async fn disable_capture(&self);
}
