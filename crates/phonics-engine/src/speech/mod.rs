//! Speech interaction episodes.
//!
//! One episode drives a single prompt-listen-match exchange with a child.
//! The episode runs as a task owning every timer, so cancelling the task
//! cancels all of them; no timer can fire for a reset or superseded
//! episode. Recognition failures degrade to fallback, never to an error
//! the learner sees.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use phonics_algo::{match_pronunciation, normalize_text};

use crate::config::EngineConfig;
use crate::events::{EpisodeEvent, FallbackReason, RecognitionEvent};
use crate::traits::{AudioPlayer, SpeechRecognizer};

/// Manual completion attempts before the swipe override arms.
const SWIPE_OVERRIDE_THRESHOLD: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EpisodeState {
    Idle,
    PlayingPrompt,
    Listening,
    PlayingFeedback,
    Matched,
    Fallback,
}

impl EpisodeState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Matched | Self::Fallback)
    }
}

#[derive(Debug)]
enum EpisodeCommand {
    PlayFeedback(String),
    SwipeAttempt,
    Reset,
}

#[derive(Debug, Clone)]
struct Snapshot {
    state: EpisodeState,
    attempts: u32,
    swipe_attempts: u32,
    can_complete: bool,
}

struct Shared {
    snapshot: Mutex<Snapshot>,
}

/// Parameters for one episode.
#[derive(Debug, Clone)]
pub struct EpisodeSpec {
    /// Text the child is asked to say.
    pub target: String,
    /// Prompt audio asset played before listening.
    pub prompt_asset: String,
    /// Bypass speech entirely; the episode goes straight to fallback.
    pub skip_speech: bool,
}

/// Control surface for a running episode. Dropping the handle aborts the
/// episode task, which is equivalent to `reset`.
pub struct EpisodeHandle {
    commands: mpsc::Sender<EpisodeCommand>,
    shared: Arc<Shared>,
    task: Option<JoinHandle<()>>,
}

impl EpisodeHandle {
    pub fn state(&self) -> EpisodeState {
        self.shared.snapshot.lock().state
    }

    pub fn attempts(&self) -> u32 {
        self.shared.snapshot.lock().attempts
    }

    /// True once the episode is satisfiable: matched, fallen back, or the
    /// swipe override has armed.
    pub fn can_complete(&self) -> bool {
        self.shared.snapshot.lock().can_complete
    }

    /// Pause listening, play a feedback asset, resume unless terminal.
    pub async fn play_feedback(&self, asset: &str) {
        let _ = self
            .commands
            .send(EpisodeCommand::PlayFeedback(asset.to_string()))
            .await;
    }

    /// Register one manual completion attempt. The second arms the
    /// override regardless of recognition state.
    pub async fn swipe_attempt(&self) {
        let _ = self.commands.send(EpisodeCommand::SwipeAttempt).await;
    }

    /// Cancel the episode. All timers die with the task.
    pub async fn reset(&mut self) {
        let _ = self.commands.send(EpisodeCommand::Reset).await;
        if let Some(task) = self.task.take() {
            task.abort();
            let _ = task.await;
        }
        let mut snap = self.shared.snapshot.lock();
        snap.state = EpisodeState::Idle;
        snap.can_complete = false;
    }
}

impl Drop for EpisodeHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Spawn an episode task. Events stream on the returned receiver.
pub fn start_episode(
    spec: EpisodeSpec,
    recognizer: Arc<dyn SpeechRecognizer>,
    player: Arc<dyn AudioPlayer>,
    config: EngineConfig,
) -> (EpisodeHandle, mpsc::Receiver<EpisodeEvent>) {
    let (event_tx, event_rx) = mpsc::channel(64);
    let (command_tx, command_rx) = mpsc::channel(16);
    let shared = Arc::new(Shared {
        snapshot: Mutex::new(Snapshot {
            state: EpisodeState::Idle,
            attempts: 0,
            swipe_attempts: 0,
            can_complete: false,
        }),
    });

    let runner = EpisodeRunner {
        spec,
        recognizer,
        player,
        config,
        shared: Arc::clone(&shared),
        events: event_tx,
    };
    let task = tokio::spawn(runner.run(command_rx));

    (
        EpisodeHandle {
            commands: command_tx,
            shared,
            task: Some(task),
        },
        event_rx,
    )
}

struct EpisodeRunner {
    spec: EpisodeSpec,
    recognizer: Arc<dyn SpeechRecognizer>,
    player: Arc<dyn AudioPlayer>,
    config: EngineConfig,
    shared: Arc<Shared>,
    events: mpsc::Sender<EpisodeEvent>,
}

impl EpisodeRunner {
    async fn run(self, mut commands: mpsc::Receiver<EpisodeCommand>) {
        info!(target = %self.spec.target, "Episode started");

        if self.spec.skip_speech {
            self.enter_fallback(FallbackReason::SpeechSkipped).await;
            return;
        }

        self.play_prompt().await;

        let (recog_tx, mut recog_rx) = mpsc::channel::<RecognitionEvent>(64);
        self.player.enable_capture().await;
        if let Err(err) = self
            .recognizer
            .start(&self.config.locale, recog_tx.clone())
            .await
        {
            warn!(error = %err, "Recognizer unavailable at episode start");
            self.player.disable_capture().await;
            self.enter_fallback(FallbackReason::RecognizerUnavailable).await;
            return;
        }
        self.set_state(EpisodeState::Listening).await;

        let deadline = tokio::time::Instant::now() + self.config.episode_timeout;
        let timeout = tokio::time::sleep_until(deadline);
        tokio::pin!(timeout);
        let mut watchdog = tokio::time::interval_at(
            tokio::time::Instant::now() + self.config.watchdog_interval,
            self.config.watchdog_interval,
        );
        let mut last_activity = tokio::time::Instant::now();
        let mut restarts: u32 = 0;

        loop {
            tokio::select! {
                event = recog_rx.recv() => {
                    last_activity = tokio::time::Instant::now();
                    match event {
                        Some(RecognitionEvent::Final(text)) => {
                            if self.handle_final(&text).await {
                                return;
                            }
                        }
                        Some(RecognitionEvent::Partial(text)) => {
                            debug!(partial = %text, "Partial recognition");
                        }
                        Some(RecognitionEvent::NoInput) => {
                            self.emit(EpisodeEvent::NoInput).await;
                        }
                        Some(RecognitionEvent::Error(message)) => {
                            warn!(error = %message, "Recognizer error mid-episode");
                            if !self.restart_recognizer(&recog_tx, &mut restarts).await {
                                return;
                            }
                        }
                        // Recognizer dropped its sender; treat as an error.
                        None => {
                            if !self.restart_recognizer(&recog_tx, &mut restarts).await {
                                return;
                            }
                        }
                    }
                }
                _ = &mut timeout => {
                    info!("Episode timeout reached");
                    self.stop_listening().await;
                    self.enter_fallback(FallbackReason::EpisodeTimeout).await;
                    return;
                }
                _ = watchdog.tick() => {
                    let alive = self.recognizer.is_listening().await;
                    let stalled = last_activity.elapsed() >= self.config.watchdog_stall;
                    if !alive || stalled {
                        debug!(alive, stalled, "Watchdog restarting recognizer");
                        if !self.restart_recognizer(&recog_tx, &mut restarts).await {
                            return;
                        }
                        last_activity = tokio::time::Instant::now();
                    }
                }
                command = commands.recv() => {
                    match command {
                        Some(EpisodeCommand::PlayFeedback(asset)) => {
                            self.play_feedback(&asset).await;
                        }
                        Some(EpisodeCommand::SwipeAttempt) => {
                            self.register_swipe().await;
                        }
                        Some(EpisodeCommand::Reset) | None => {
                            self.stop_listening().await;
                            self.shared.snapshot.lock().state = EpisodeState::Idle;
                            return;
                        }
                    }
                }
            }
        }
    }

    /// Prompt playback is bounded; failure or expiry proceeds to listening.
    async fn play_prompt(&self) {
        self.set_state(EpisodeState::PlayingPrompt).await;
        self.player.disable_capture().await;
        let playback = self.player.play(&self.spec.prompt_asset);
        match tokio::time::timeout(self.config.prompt_timeout, playback).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => warn!(error = %err, "Prompt playback failed, listening anyway"),
            Err(_) => warn!("Prompt playback timed out, listening anyway"),
        }
    }

    /// Returns true when the episode reached a terminal state.
    async fn handle_final(&self, text: &str) -> bool {
        // A blank final result is silence, not a wrong answer: no attempt
        // is charged and listening continues.
        if normalize_text(text).is_empty() {
            self.emit(EpisodeEvent::NoInput).await;
            return false;
        }
        let outcome = match_pronunciation(text, &self.spec.target);
        if outcome.matched {
            self.stop_listening().await;
            {
                let mut snap = self.shared.snapshot.lock();
                snap.state = EpisodeState::Matched;
                snap.can_complete = true;
            }
            self.emit(EpisodeEvent::StateChanged(EpisodeState::Matched)).await;
            self.emit(EpisodeEvent::Matched {
                confidence: outcome.confidence,
            })
            .await;
            info!(confidence = outcome.confidence, "Episode matched");
            true
        } else {
            let attempts = {
                let mut snap = self.shared.snapshot.lock();
                snap.attempts += 1;
                snap.attempts
            };
            self.emit(EpisodeEvent::Incorrect {
                recognized: text.to_string(),
                attempts,
            })
            .await;
            false
        }
    }

    /// Bounded silent restart. Returns false once the budget is spent and
    /// the episode has fallen back.
    async fn restart_recognizer(
        &self,
        recog_tx: &mpsc::Sender<RecognitionEvent>,
        restarts: &mut u32,
    ) -> bool {
        *restarts += 1;
        if *restarts > self.config.recognizer_restart_budget {
            warn!(restarts = *restarts, "Recognizer restart budget exhausted");
            self.stop_listening().await;
            self.enter_fallback(FallbackReason::RestartBudgetExhausted).await;
            return false;
        }
        debug!(attempt = *restarts, "Restarting recognizer");
        self.recognizer.stop().await;
        if let Err(err) = self
            .recognizer
            .start(&self.config.locale, recog_tx.clone())
            .await
        {
            warn!(error = %err, "Recognizer restart failed");
            self.stop_listening().await;
            self.enter_fallback(FallbackReason::RecognizerUnavailable).await;
            return false;
        }
        true
    }

    /// Playback and capture are mutually exclusive; listening pauses for
    /// the clip and resumes unless the episode ended meanwhile.
    async fn play_feedback(&self, asset: &str) {
        let was_terminal = self.shared.snapshot.lock().state.is_terminal();
        if !was_terminal {
            self.set_state(EpisodeState::PlayingFeedback).await;
        }
        self.player.disable_capture().await;
        if let Err(err) = self.player.play(asset).await {
            warn!(error = %err, "Feedback playback failed");
        }
        if !self.shared.snapshot.lock().state.is_terminal() {
            self.player.enable_capture().await;
            self.set_state(EpisodeState::Listening).await;
        }
    }

    async fn register_swipe(&self) {
        let armed = {
            let mut snap = self.shared.snapshot.lock();
            snap.swipe_attempts += 1;
            if snap.swipe_attempts >= SWIPE_OVERRIDE_THRESHOLD && !snap.can_complete {
                snap.can_complete = true;
                true
            } else {
                false
            }
        };
        if armed {
            info!("Swipe override armed");
            self.emit(EpisodeEvent::SwipeCompletable).await;
        }
    }

    async fn enter_fallback(&self, reason: FallbackReason) {
        {
            let mut snap = self.shared.snapshot.lock();
            snap.state = EpisodeState::Fallback;
            snap.can_complete = true;
        }
        self.emit(EpisodeEvent::StateChanged(EpisodeState::Fallback)).await;
        self.emit(EpisodeEvent::Fallback { reason }).await;
        info!(reason = ?reason, "Episode fell back");
    }

    async fn stop_listening(&self) {
        self.recognizer.stop().await;
        self.player.disable_capture().await;
    }

    async fn set_state(&self, state: EpisodeState) {
        self.shared.snapshot.lock().state = state;
        self.emit(EpisodeEvent::StateChanged(state)).await;
    }

    async fn emit(&self, event: EpisodeEvent) {
        // Receiver may be gone when the host tears the UI down first.
        let _ = self.events.send(event).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(EpisodeState::Matched.is_terminal());
        assert!(EpisodeState::Fallback.is_terminal());
        assert!(!EpisodeState::Listening.is_terminal());
        assert!(!EpisodeState::PlayingFeedback.is_terminal());
    }

    #[test]
    fn test_state_serialization() {
        let json = serde_json::to_string(&EpisodeState::PlayingPrompt).unwrap();
        assert_eq!(json, "\"PLAYING_PROMPT\"");
    }
}
