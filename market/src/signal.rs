//! Short/long moving-average crossover signal over a price series.

use crate::crossover::{Crossovers, detect_crossovers};
use crate::error::MarketError;
use crate::rolling_window::RollingAverage;
use crate::types::{AverageSeries, Direction, PricePoint};

pub const DEFAULT_SHORT_WINDOW: usize = 5;
pub const DEFAULT_LONG_WINDOW: usize = 20;

/// Pair of rolling averages evaluated on closing prices.
#[derive(Debug, Clone, Copy)]
pub struct MaCrossover {
    short: RollingAverage,
    long: RollingAverage,
}

impl MaCrossover {
    pub fn new(short_window: usize, long_window: usize) -> Result<Self, MarketError> {
        if short_window >= long_window {
            return Err(MarketError::WindowOrder {
                short: short_window,
                long: long_window,
            });
        }

        Ok(Self {
            short: RollingAverage::new(short_window)?,
            long: RollingAverage::new(long_window)?,
        })
    }

    pub fn short_window(&self) -> usize {
        self.short.window()
    }

    pub fn long_window(&self) -> usize {
        self.long.window()
    }

    pub fn evaluate(&self, series: &[PricePoint]) -> SignalSnapshot {
        let closes: Vec<f64> = series.iter().map(|p| p.close).collect();

        let short = self.short.compute(&closes);
        let long = self.long.compute(&closes);
        let crossovers = detect_crossovers(&short, &long);

        SignalSnapshot {
            short,
            long,
            crossovers,
        }
    }
}

impl Default for MaCrossover {
    fn default() -> Self {
        Self {
            short: RollingAverage {
                window: DEFAULT_SHORT_WINDOW,
                min_period: DEFAULT_SHORT_WINDOW,
            },
            long: RollingAverage {
                window: DEFAULT_LONG_WINDOW,
                min_period: DEFAULT_LONG_WINDOW,
            },
        }
    }
}

/// Result of one evaluation; recomputed from scratch every poll.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalSnapshot {
    pub short: AverageSeries,
    pub long: AverageSeries,
    pub crossovers: Crossovers,
}

impl SignalSnapshot {
    /// Price point at the most recent crossover of `direction`, if any.
    pub fn latest<'a>(
        &self,
        direction: Direction,
        series: &'a [PricePoint],
    ) -> Option<&'a PricePoint> {
        self.crossovers
            .last(direction)
            .and_then(|index| series.get(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_inverted_windows() {
        assert_eq!(
            MaCrossover::new(20, 5).unwrap_err(),
            MarketError::WindowOrder { short: 20, long: 5 }
        );
        assert!(MaCrossover::new(0, 5).is_err());
    }

    #[test]
    fn default_uses_five_and_twenty() {
        let s = MaCrossover::default();
        assert_eq!(s.short_window(), 5);
        assert_eq!(s.long_window(), 20);
    }

    #[test]
    fn latest_maps_index_to_price_point() {
        let series: Vec<PricePoint> = [1.0, 3.0, 1.0]
            .iter()
            .enumerate()
            .map(|(i, c)| PricePoint::flat(i as i64 * 1_000, *c))
            .collect();

        let snap = MaCrossover::new(1, 2).unwrap().evaluate(&series);

        // short == close, long == mean of last two closes
        assert_eq!(snap.short, vec![Some(1.0), Some(3.0), Some(1.0)]);
        assert_eq!(snap.long, vec![None, Some(2.0), Some(2.0)]);
        assert_eq!(snap.crossovers.sells, vec![1]);
        assert_eq!(snap.crossovers.buys, vec![2]);

        let buy = snap.latest(Direction::Buy, &series).unwrap();
        assert_eq!(buy.timestamp_ms, 2_000);
        assert!(snap.latest(Direction::Sell, &series).is_some());
    }

    #[test]
    fn too_short_series_has_no_signal() {
        let series: Vec<PricePoint> = (0..10).map(|i| PricePoint::flat(i, 100.0)).collect();
        let snap = MaCrossover::default().evaluate(&series);

        assert!(snap.long.iter().all(Option::is_none));
        assert!(snap.crossovers.is_empty());
        assert!(snap.latest(Direction::Buy, &series).is_none());
    }
}
