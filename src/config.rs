//! Application-level configuration loading: game timings, economy and retry policy.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use serde_with::{DurationMilliSeconds, serde_as};
use tracing::{info, warn};

use crate::state::inventory::PowerUpKind;

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "FLIP_MATCH_BACK_CONFIG_PATH";
/// Treasury receiving entry fees and purchases when none is configured.
const DEFAULT_TREASURY_ADDRESS: &str = "0x04823b9e53F6e921BcBf49737ed94aec3f2778ef";

/// Durations driving a flip-match session.
#[serde_as]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GameTimings {
    /// How long two mismatched cards stay visible.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "mismatch_cooldown_ms")]
    pub mismatch_cooldown: Duration,
    /// How long a peek keeps every card visible.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "peek_window_ms")]
    pub peek_window: Duration,
    /// Time added to the score per power-up used after the first flip.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "powerup_penalty_ms")]
    pub powerup_penalty: Duration,
    /// Cadence of the elapsed-time sampler while the timer runs.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "sample_interval_ms")]
    pub sample_interval: Duration,
}

impl Default for GameTimings {
    fn default() -> Self {
        Self {
            mismatch_cooldown: Duration::from_millis(1_000),
            peek_window: Duration::from_millis(2_000),
            powerup_penalty: Duration::from_millis(5_000),
            sample_interval: Duration::from_millis(50),
        }
    }
}

/// Prices and payout rules, all amounts in cents.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Economy {
    /// Address receiving entry fees and power-up purchases.
    pub treasury_address: String,
    /// Price of one play.
    pub entry_fee_cents: u64,
    /// Price of one peek.
    pub peek_price_cents: u64,
    /// Price of one auto-match.
    pub auto_match_price_cents: u64,
    /// Share of the day's entry fees paid out, in percent.
    pub payout_pool_percent: u64,
    /// Share of the pool per rank, in percent, best time first.
    pub payout_splits_percent: Vec<u64>,
}

impl Default for Economy {
    fn default() -> Self {
        Self {
            treasury_address: DEFAULT_TREASURY_ADDRESS.to_string(),
            entry_fee_cents: 100,
            peek_price_cents: 50,
            auto_match_price_cents: 50,
            payout_pool_percent: 80,
            payout_splits_percent: vec![50, 30, 20],
        }
    }
}

/// Retry rule for best-effort bridge calls: fixed attempts, linear backoff.
#[serde_as]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub attempts: u32,
    /// Delay added per failed attempt.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "backoff_step_ms")]
    pub backoff_step: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff_step: Duration::from_millis(200),
        }
    }
}

impl RetryPolicy {
    /// Delay to wait after the `attempt`-th failure (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.backoff_step * attempt
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Session timings.
    pub timings: GameTimings,
    /// Prices and payouts.
    pub economy: Economy,
    /// Number of rows returned by the leaderboard.
    pub leaderboard_size: usize,
    /// Retry rule for best-effort bridge calls.
    pub retry: RetryPolicy,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            timings: GameTimings::default(),
            economy: Economy::default(),
            leaderboard_size: 50,
            retry: RetryPolicy::default(),
        }
    }
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(config) => {
                    info!(
                        path = %path.display(),
                        entry_fee_cents = config.economy.entry_fee_cents,
                        "loaded configuration"
                    );
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Parse a JSON document; missing sections and fields keep their defaults.
    pub fn from_json(contents: &str) -> serde_json::Result<Self> {
        serde_json::from_str(contents)
    }

    /// Price of one charge of a power-up.
    pub fn powerup_price_cents(&self, kind: PowerUpKind) -> u64 {
        match kind {
            PowerUpKind::Peek => self.economy.peek_price_cents,
            PowerUpKind::AutoMatch => self.economy.auto_match_price_cents,
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
