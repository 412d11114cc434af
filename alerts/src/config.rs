use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, anyhow};

/// What the pipeline assumes when no notified-signal state exists yet
/// (first run, or the stored state is unreadable).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FirstRunPolicy {
    /// Pretend every crossover up to the newest price point was already
    /// notified. Only crossovers observed after startup produce alerts.
    SeedFromLatest,

    /// Start from epoch zero: every historical crossover in the first
    /// fetched window is treated as new.
    NotifyHistory,
}

impl FromStr for FirstRunPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "seed" | "seed-from-latest" => Ok(Self::SeedFromLatest),
            "notify-history" | "epoch" => Ok(Self::NotifyHistory),
            other => Err(anyhow!("unknown first-run policy: {other}")),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Database connection string. Holds subscriptions and, unless
    /// `signal_state_path` is set, the notified-signal state.
    pub database_url: String,

    // =========================
    // Signal configuration
    // =========================
    /// Ticker passed to the price source (e.g. `btc-usd`).
    pub symbol: String,

    /// Short rolling-average window (samples).
    pub short_window: usize,

    /// Long rolling-average window (samples).
    pub long_window: usize,

    /// Bar interval requested from the price source.
    pub price_interval: String,

    /// Lookback range requested from the price source.
    pub price_range: String,

    /// Base URL of the Yahoo chart API.
    pub yahoo_base_url: String,

    /// Time between two poll cycles.
    pub poll_interval: Duration,

    /// See [`FirstRunPolicy`].
    pub first_run_policy: FirstRunPolicy,

    /// When set, the notified-signal state lives in this JSON file instead of
    /// the database.
    pub signal_state_path: Option<String>,

    // =========================
    // Delivery configuration
    // =========================
    /// Click-through URL placed in every notification.
    pub notification_url: String,

    /// Web Push relay; it owns payload encryption and VAPID signing.
    pub push_relay_url: String,

    /// Time-to-live hint (seconds) forwarded to the push service.
    pub push_ttl_secs: u32,

    /// Per-request timeout for outbound HTTP.
    pub http_timeout: Duration,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://crossover_alerts.db?mode=rwc".to_string());

        let cfg = Self {
            database_url,

            symbol: env_or("SIGNAL_SYMBOL", "btc-usd".to_string())?,
            short_window: env_or("SHORT_WINDOW", market::signal::DEFAULT_SHORT_WINDOW)?,
            long_window: env_or("LONG_WINDOW", market::signal::DEFAULT_LONG_WINDOW)?,
            price_interval: env_or("PRICE_INTERVAL", "15m".to_string())?,
            price_range: env_or("PRICE_RANGE", "1mo".to_string())?,
            yahoo_base_url: env_or(
                "YAHOO_BASE_URL",
                "https://query2.finance.yahoo.com".to_string(),
            )?,
            poll_interval: Duration::from_secs(env_or("POLL_INTERVAL_SECS", 60u64)?),
            first_run_policy: env_or("FIRST_RUN_POLICY", FirstRunPolicy::SeedFromLatest)?,
            signal_state_path: std::env::var("SIGNAL_STATE_PATH")
                .ok()
                .filter(|p| !p.trim().is_empty()),

            notification_url: env_or("NOTIFICATION_URL", "/".to_string())?,
            push_relay_url: env_or(
                "PUSH_RELAY_URL",
                "http://127.0.0.1:8787/push".to_string(),
            )?,
            push_ttl_secs: env_or("PUSH_TTL_SECS", 3_600u32)?,
            http_timeout: Duration::from_secs(env_or("HTTP_TIMEOUT_SECS", 10u64)?),
        };

        if cfg.poll_interval.is_zero() {
            return Err(anyhow!("POLL_INTERVAL_SECS must be > 0"));
        }

        Ok(cfg)
    }
}

/// Reads `key` and parses it, falling back to `default` when unset.
fn env_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow!("{e}"))
            .with_context(|| format!("invalid value for {key}: {raw:?}")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_first_run_policy_aliases() {
        assert_eq!(
            "seed".parse::<FirstRunPolicy>().unwrap(),
            FirstRunPolicy::SeedFromLatest
        );
        assert_eq!(
            " Notify-History ".parse::<FirstRunPolicy>().unwrap(),
            FirstRunPolicy::NotifyHistory
        );
        assert!("always".parse::<FirstRunPolicy>().is_err());
    }

    #[test]
    fn unset_key_falls_back_to_default() {
        let v: usize = env_or("CROSSOVER_ALERTS_TEST_UNSET_KEY", 42).unwrap();
        assert_eq!(v, 42);
    }
}
