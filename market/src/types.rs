use std::fmt;

use serde::{Deserialize, Serialize};

/// One OHLC sample of the polled series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Epoch milliseconds.
    pub timestamp_ms: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl PricePoint {
    /// Flat candle where every price equals `close`.
    pub fn flat(timestamp_ms: i64, close: f64) -> Self {
        Self {
            timestamp_ms,
            open: close,
            high: close,
            low: close,
            close,
        }
    }
}

/// Rolling mean aligned index-for-index with its input. `None` marks warm-up.
pub type AverageSeries = Vec<Option<f64>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Long average moved strictly above the short average.
    Buy,
    /// Long average moved strictly below the short average.
    Sell,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Buy => "Buy",
            Direction::Sell => "Sell",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Index into the aligned price/average sequences where a cross fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossoverEvent {
    pub index: usize,
    pub direction: Direction,
}
