use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MarketError {
    #[error("rolling window must be >= 1")]
    ZeroWindow,

    #[error("minimum period must be >= 1")]
    ZeroMinPeriod,

    #[error("short window ({short}) must be smaller than long window ({long})")]
    WindowOrder { short: usize, long: usize },
}
