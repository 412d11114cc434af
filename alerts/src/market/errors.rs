use thiserror::Error;

#[derive(Error, Debug)]
pub enum PriceSourceError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("price source returned HTTP {status} for {symbol}")]
    Status { symbol: String, status: u16 },

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("malformed price payload: {0}")]
    Malformed(String),
}
