//! Persisted "last notified" crossover timestamps.
//!
//! The state is an explicit value: loaded at the start of a cycle, compared,
//! possibly advanced, and saved at most once.

pub mod file_store;
pub mod repository_sqlx;

use anyhow::Result;
use async_trait::async_trait;
use market::Direction;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

pub use file_store::JsonFileSignalStateStore;
pub use repository_sqlx::SqlxSignalStateStore;

/// Timestamp (epoch ms) of the last notified buy and sell crossover.
///
/// Both fields only ever move forward: [`DedupState::advance`] accepts a
/// timestamp only when it is strictly greater than the stored one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DedupState {
    pub last_buy_ts_ms: i64,
    pub last_sell_ts_ms: i64,
}

impl DedupState {
    pub fn new(last_buy_ts_ms: i64, last_sell_ts_ms: i64) -> Self {
        Self {
            last_buy_ts_ms,
            last_sell_ts_ms,
        }
    }

    /// Both thresholds set to `ts_ms`.
    pub fn seeded(ts_ms: i64) -> Self {
        Self::new(ts_ms, ts_ms)
    }

    pub fn last(&self, direction: Direction) -> i64 {
        match direction {
            Direction::Buy => self.last_buy_ts_ms,
            Direction::Sell => self.last_sell_ts_ms,
        }
    }

    /// Moves the threshold for `direction` to `ts_ms` if it is newer.
    /// Returns whether anything changed.
    pub fn advance(&mut self, direction: Direction, ts_ms: i64) -> bool {
        let slot = match direction {
            Direction::Buy => &mut self.last_buy_ts_ms,
            Direction::Sell => &mut self.last_sell_ts_ms,
        };

        if ts_ms > *slot {
            *slot = ts_ms;
            true
        } else {
            false
        }
    }
}

#[async_trait]
pub trait SignalStateStore: Send + Sync {
    /// `Ok(None)` means nothing has been stored yet.
    async fn load(&self) -> Result<Option<DedupState>>;

    async fn save(&self, state: &DedupState) -> Result<()>;
}

/// Process-local store; state is lost on restart.
#[derive(Default)]
pub struct InMemorySignalStateStore {
    state: Mutex<Option<DedupState>>,
}

impl InMemorySignalStateStore {
    pub fn new(initial: Option<DedupState>) -> Self {
        Self {
            state: Mutex::new(initial),
        }
    }

    pub fn current(&self) -> Option<DedupState> {
        *self.state.lock()
    }
}

#[async_trait]
impl SignalStateStore for InMemorySignalStateStore {
    async fn load(&self) -> Result<Option<DedupState>> {
        Ok(*self.state.lock())
    }

    async fn save(&self, state: &DedupState) -> Result<()> {
        *self.state.lock() = Some(*state);
        Ok(())
    }
}
