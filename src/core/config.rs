//! Configuration for the chat core.

use std::path::PathBuf;
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::core::errors::{ChatError, ChatResult};

/// Top-level configuration shared by the session and conversation stores.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Simulated latency of each operation.
    pub delays: DelayConfig,
    /// Synthetic history settings.
    pub history: HistoryConfig,
    /// Directory of the JSON blob store.
    pub storage_dir: PathBuf,
    /// Seed for every random source; `None` seeds from entropy.
    pub rng_seed: Option<u64>,
    /// Probability in `[0, 1]` that a simulated round-trip fails.
    pub failure_rate: f64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            delays: DelayConfig::default(),
            history: HistoryConfig::default(),
            storage_dir: PathBuf::from(".parley"),
            rng_seed: None,
            failure_rate: 0.0,
        }
    }
}

impl ChatConfig {
    /// Create a new config with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a config from defaults plus `PARLEY_*` environment overrides.
    ///
    /// # Errors
    /// Returns an error if an override cannot be parsed or the result is invalid.
    pub fn from_env() -> ChatResult<Self> {
        let mut config = Self::default();

        if let Ok(dir) = std::env::var("PARLEY_STORAGE_DIR") {
            config.storage_dir = PathBuf::from(dir);
        }
        if let Ok(seed) = std::env::var("PARLEY_RNG_SEED") {
            let seed = seed.parse().map_err(|_| {
                ChatError::InvalidConfig(format!("PARLEY_RNG_SEED is not a u64: {seed}"))
            })?;
            config.rng_seed = Some(seed);
        }
        if let Ok(rate) = std::env::var("PARLEY_FAILURE_RATE") {
            config.failure_rate = rate.parse().map_err(|_| {
                ChatError::InvalidConfig(format!("PARLEY_FAILURE_RATE is not a number: {rate}"))
            })?;
        }
        if std::env::var("PARLEY_FAST").is_ok_and(|v| v == "1" || v == "true") {
            config.delays = DelayConfig::instant();
        }

        config.validate()?;
        Ok(config)
    }

    /// Set the delay table.
    #[must_use]
    pub const fn with_delays(mut self, delays: DelayConfig) -> Self {
        self.delays = delays;
        self
    }

    /// Set the storage directory.
    #[must_use]
    pub fn with_storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage_dir = dir.into();
        self
    }

    /// Set the random seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    /// Set the simulated failure rate.
    #[must_use]
    pub const fn with_failure_rate(mut self, rate: f64) -> Self {
        self.failure_rate = rate;
        self
    }

    /// Build a random source for one component.
    ///
    /// With a seed, each `stream` yields a distinct but reproducible sequence.
    #[must_use]
    pub fn rng(&self, stream: u64) -> StdRng {
        match self.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(stream)),
            None => StdRng::from_entropy(),
        }
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    /// Returns an error if any values are out of range or invalid.
    pub fn validate(&self) -> ChatResult<()> {
        if self.delays.reply_min > self.delays.reply_max {
            return Err(ChatError::InvalidConfig(
                "delays.reply_min must be <= delays.reply_max".to_string(),
            ));
        }

        if self.history.batch_size == 0 {
            return Err(ChatError::InvalidConfig(
                "history.batch_size must be > 0".to_string(),
            ));
        }

        if self.history.spacing_seconds == 0 {
            return Err(ChatError::InvalidConfig(
                "history.spacing_seconds must be > 0".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.failure_rate) {
            return Err(ChatError::InvalidConfig(format!(
                "failure_rate must be in [0, 1], got {}",
                self.failure_rate
            )));
        }

        Ok(())
    }
}

/// Simulated latency per operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayConfig {
    /// Sending a verification code.
    #[serde(with = "duration_ms")]
    pub send_code: Duration,
    /// Verifying a code.
    #[serde(with = "duration_ms")]
    pub verify_code: Duration,
    /// Creating a chatroom.
    #[serde(with = "duration_ms")]
    pub create_chatroom: Duration,
    /// Deleting a chatroom.
    #[serde(with = "duration_ms")]
    pub delete_chatroom: Duration,
    /// Loading a page of older messages.
    #[serde(with = "duration_ms")]
    pub load_older: Duration,
    /// Lower bound of the assistant typing delay.
    #[serde(with = "duration_ms")]
    pub reply_min: Duration,
    /// Upper bound of the assistant typing delay.
    #[serde(with = "duration_ms")]
    pub reply_max: Duration,
}

impl Default for DelayConfig {
    fn default() -> Self {
        Self {
            send_code: Duration::from_millis(2000),
            verify_code: Duration::from_millis(1500),
            create_chatroom: Duration::from_millis(1000),
            delete_chatroom: Duration::from_millis(800),
            load_older: Duration::from_millis(1000),
            reply_min: Duration::from_millis(1500),
            reply_max: Duration::from_millis(3500),
        }
    }
}

impl DelayConfig {
    /// All delays set to zero.
    #[must_use]
    pub const fn instant() -> Self {
        Self {
            send_code: Duration::ZERO,
            verify_code: Duration::ZERO,
            create_chatroom: Duration::ZERO,
            delete_chatroom: Duration::ZERO,
            load_older: Duration::ZERO,
            reply_min: Duration::ZERO,
            reply_max: Duration::ZERO,
        }
    }
}

/// Synthetic history settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Messages generated per page.
    pub batch_size: usize,
    /// Gap between consecutive synthetic messages.
    pub spacing_seconds: u64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            batch_size: 20,
            spacing_seconds: 3600,
        }
    }
}

/// Serde module for millisecond durations.
mod duration_ms {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        u64::try_from(duration.as_millis())
            .unwrap_or(u64::MAX)
            .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
