use std::time::Duration;

/// Engine tunables, read from the environment with sensible defaults.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum number of items in one practice session.
    pub session_size: usize,
    /// Hard cap on one listening episode before falling back.
    pub episode_timeout: Duration,
    /// How often the watchdog re-verifies recognizer liveness.
    pub watchdog_interval: Duration,
    /// Silence span after which the watchdog deems the recognizer stalled
    /// and spends a restart. Must exceed `watchdog_interval` to be useful.
    pub watchdog_stall: Duration,
    /// Cap on prompt playback; expiry proceeds to listening regardless.
    pub prompt_timeout: Duration,
    /// Silent recognizer restarts allowed before forcing fallback.
    pub recognizer_restart_budget: u32,
    /// Attempts for one content-generation call (first try included).
    pub generator_max_retries: u32,
    /// Base delay for generation retry backoff; doubles per retry.
    pub generator_base_backoff: Duration,
    /// An item practiced within this window is kept out of the next fill.
    pub anti_repeat_window: Duration,
    /// BCP-47 locale handed to the speech recognizer.
    pub locale: String,
    pub log_level: String,
    pub database_url: String,
}

impl EngineConfig {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self {
            session_size: env_parse("SESSION_SIZE", 10),
            episode_timeout: Duration::from_millis(env_parse("EPISODE_TIMEOUT_MS", 15_000)),
            watchdog_interval: Duration::from_millis(env_parse("WATCHDOG_INTERVAL_MS", 5_000)),
            watchdog_stall: Duration::from_millis(env_parse("WATCHDOG_STALL_MS", 10_000)),
            prompt_timeout: Duration::from_millis(env_parse("PROMPT_TIMEOUT_MS", 8_000)),
            recognizer_restart_budget: env_parse("RECOGNIZER_RESTART_BUDGET", 3),
            generator_max_retries: env_parse("GENERATOR_MAX_RETRIES", 3),
            generator_base_backoff: Duration::from_millis(env_parse(
                "GENERATOR_BASE_BACKOFF_MS",
                250,
            )),
            anti_repeat_window: Duration::from_secs(env_parse("ANTI_REPEAT_SECONDS", 5)),
            locale: std::env::var("SPEECH_LOCALE").unwrap_or_else(|_| "en-US".to_string()),
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite::memory:".to_string()),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            session_size: 10,
            episode_timeout: Duration::from_secs(15),
            watchdog_interval: Duration::from_secs(5),
            watchdog_stall: Duration::from_secs(10),
            prompt_timeout: Duration::from_secs(8),
            recognizer_restart_budget: 3,
            generator_max_retries: 3,
            generator_base_backoff: Duration::from_millis(250),
            anti_repeat_window: Duration::from_secs(5),
            locale: "en-US".to_string(),
            log_level: "info".to_string(),
            database_url: "sqlite::memory:".to_string(),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse::<T>().ok())
        .unwrap_or(default)
}
