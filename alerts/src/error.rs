use thiserror::Error;

use crate::market::PriceSourceError;

#[derive(Error, Debug)]
pub enum PipelineError {
    /// Price source unreachable or payload unusable. Nothing was sent and no
    /// state was touched.
    #[error("price acquisition failed: {0}")]
    Acquisition(#[from] PriceSourceError),

    #[error("price source returned an empty series for {symbol}")]
    EmptySeries { symbol: String },
}
