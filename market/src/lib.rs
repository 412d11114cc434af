//! Pure signal core: price points, rolling averages and crossover detection.
//!
//! Nothing in this crate performs I/O; every function is a deterministic
//! transformation of its inputs.

pub mod crossover;
pub mod error;
pub mod rolling_window;
pub mod signal;
pub mod types;

pub use crossover::{Crossovers, detect_crossovers};
pub use error::MarketError;
pub use rolling_window::{RollingAverage, rolling_average, round_tenths};
pub use signal::{MaCrossover, SignalSnapshot};
pub use types::{AverageSeries, CrossoverEvent, Direction, PricePoint};
