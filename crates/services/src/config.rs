use std::env;
use std::time::Duration;

/// Default time allowed for the question fetch before giving up.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(3);

/// Default time the answer stays on screen before the next question.
pub const DEFAULT_REVEAL_DELAY: Duration = Duration::from_secs(3);

/// Tunables for a game run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GameConfig {
    pub fetch_timeout: Duration,
    pub reveal_delay: Duration,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            reveal_delay: DEFAULT_REVEAL_DELAY,
        }
    }
}

impl GameConfig {
    /// Reads `GEOQUEST_FETCH_TIMEOUT_MS` and `GEOQUEST_REVEAL_DELAY_MS`,
    /// keeping defaults for anything unset or unparsable.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let millis = |key: &str| {
            lookup(key)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_millis)
        };
        let defaults = Self::default();
        Self {
            fetch_timeout: millis("GEOQUEST_FETCH_TIMEOUT_MS").unwrap_or(defaults.fetch_timeout),
            reveal_delay: millis("GEOQUEST_REVEAL_DELAY_MS").unwrap_or(defaults.reveal_delay),
        }
    }

    #[must_use]
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_reveal_delay(mut self, delay: Duration) -> Self {
        self.reveal_delay = delay;
        self
    }
}
