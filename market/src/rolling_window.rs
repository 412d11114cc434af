//! Rolling average over a price sequence.
//!
//! The window is gathered backwards from the current index and stops early at
//! the start of the series or at the first *empty* sample (`0.0` or `NaN`).
//! The current sample itself is always part of its own window. Means are
//! rounded to one decimal place, half away from zero.

use crate::error::MarketError;
use crate::types::AverageSeries;

/// Windowed mean with a warm-up gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RollingAverage {
    pub(crate) window: usize,
    pub(crate) min_period: usize,
}

impl RollingAverage {
    /// Window with `min_period == window`.
    pub fn new(window: usize) -> Result<Self, MarketError> {
        Self::with_min_period(window, window)
    }

    pub fn with_min_period(window: usize, min_period: usize) -> Result<Self, MarketError> {
        if window == 0 {
            return Err(MarketError::ZeroWindow);
        }
        if min_period == 0 {
            return Err(MarketError::ZeroMinPeriod);
        }
        Ok(Self { window, min_period })
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn min_period(&self) -> usize {
        self.min_period
    }

    pub fn compute(&self, values: &[f64]) -> AverageSeries {
        rolling_average(values, self.window, self.min_period)
    }
}

/// Computes the rolling mean of `values`.
///
/// Output has the same length as the input. Indices below `min_period - 1`
/// are `None`. A mean that is not finite (e.g. the current sample is `NaN`)
/// is also reported as `None`.
pub fn rolling_average(values: &[f64], window: usize, min_period: usize) -> AverageSeries {
    let warm_up = min_period.saturating_sub(1);
    let lookback = window.saturating_sub(1);

    values
        .iter()
        .enumerate()
        .map(|(index, &current)| {
            if index < warm_up {
                return None;
            }

            let mut sum = current;
            let mut count = 1usize;

            // Current sample is already counted; walk into the past.
            for past in (index.saturating_sub(lookback)..index).rev() {
                let value = values[past];
                if is_empty_sample(value) {
                    break;
                }
                sum += value;
                count += 1;
            }

            let mean = round_tenths(sum / count as f64);
            mean.is_finite().then_some(mean)
        })
        .collect()
}

fn is_empty_sample(v: f64) -> bool {
    v == 0.0 || v.is_nan()
}

/// `f64::round` rounds half away from zero.
pub fn round_tenths(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn three_period_mean() {
        let out = rolling_average(&[10.0, 20.0, 30.0, 40.0, 50.0], 3, 3);
        assert_eq!(out, vec![None, None, Some(20.0), Some(30.0), Some(40.0)]);
    }

    #[test]
    fn short_min_period_uses_partial_windows() {
        let out = rolling_average(&[10.0, 20.0, 30.0, 40.0], 3, 1);
        assert_eq!(out, vec![Some(10.0), Some(15.0), Some(20.0), Some(30.0)]);
    }

    #[test]
    fn zero_sample_stops_backward_scan() {
        let out = rolling_average(&[5.0, 0.0, 10.0, 20.0], 3, 1);
        // idx1: current 0 is kept, idx0 is gathered
        // idx2 and idx3: scan stops at the zero at idx1
        assert_eq!(out, vec![Some(5.0), Some(2.5), Some(10.0), Some(15.0)]);
    }

    #[test]
    fn nan_sample_stops_backward_scan() {
        let out = rolling_average(&[4.0, f64::NAN, 6.0, 8.0], 4, 1);
        assert_eq!(out[2], Some(6.0));
        assert_eq!(out[3], Some(7.0));
        // NaN as current sample poisons its own mean
        assert_eq!(out[1], None);
    }

    #[test]
    fn rounds_half_away_from_zero() {
        // mean(1.0, 1.5) = 1.25 -> 1.3
        let out = rolling_average(&[1.0, 1.5], 2, 2);
        assert_eq!(out[1], Some(1.3));

        let out = rolling_average(&[-1.0, -1.5], 2, 2);
        assert_eq!(out[1], Some(-1.3));
    }

    #[test]
    fn min_period_larger_than_window_only_delays_output() {
        let out = rolling_average(&[2.0, 4.0, 6.0, 8.0], 2, 3);
        assert_eq!(out, vec![None, None, Some(5.0), Some(7.0)]);
    }

    #[test]
    fn empty_input_yields_empty_series() {
        assert!(rolling_average(&[], 5, 5).is_empty());
    }

    #[test]
    fn checked_constructor_rejects_zero_parameters() {
        assert_eq!(RollingAverage::new(0), Err(MarketError::ZeroWindow));
        assert_eq!(
            RollingAverage::with_min_period(5, 0),
            Err(MarketError::ZeroMinPeriod)
        );

        let avg = RollingAverage::new(3).unwrap();
        assert_eq!(avg.min_period(), 3);
        assert_eq!(
            avg.compute(&[1.0, 2.0, 3.0]),
            vec![None, None, Some(2.0)]
        );
    }

    proptest! {
        #[test]
        fn output_is_aligned_and_warm_up_is_empty(
            values in prop::collection::vec(1.0f64..10_000.0, 0..64),
            window in 1usize..30,
            min_period in 1usize..30,
        ) {
            let out = rolling_average(&values, window, min_period);
            prop_assert_eq!(out.len(), values.len());

            for (i, v) in out.iter().enumerate() {
                if i < min_period - 1 {
                    prop_assert!(v.is_none());
                } else {
                    prop_assert!(v.is_some());
                }
            }
        }

        #[test]
        fn mean_stays_within_window_bounds(
            values in prop::collection::vec(1.0f64..10_000.0, 1..64),
            window in 1usize..30,
        ) {
            let out = rolling_average(&values, window, 1);
            for (i, v) in out.iter().enumerate() {
                let start = i.saturating_sub(window - 1);
                let slice = &values[start..=i];
                let lo = slice.iter().cloned().fold(f64::INFINITY, f64::min);
                let hi = slice.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
                let v = v.unwrap();
                prop_assert!(v >= lo - 0.05 && v <= hi + 0.05);
            }
        }
    }
}
