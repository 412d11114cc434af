//! Price acquisition.

pub mod errors;
pub mod yahoo;

use async_trait::async_trait;
use market::PricePoint;

pub use errors::PriceSourceError;
pub use yahoo::YahooPriceSource;

/// Source of the series the signal is computed on.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Returns the series for `symbol`, ascending by timestamp.
    async fn fetch_series(&self, symbol: &str) -> Result<Vec<PricePoint>, PriceSourceError>;
}
