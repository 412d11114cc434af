//! Crossover extraction between a short and a long average series.
//!
//! Each direction is scanned independently with an arm/fire latch: a cross is
//! recorded only when the latch is armed, and recording disarms it until the
//! averages are observed on the opposite side again. This yields at most one
//! event per directional swing instead of one per sample.

use crate::types::{CrossoverEvent, Direction};

/// Indices of every recorded crossover, per direction, in ascending order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Crossovers {
    pub buys: Vec<usize>,
    pub sells: Vec<usize>,
}

impl Crossovers {
    pub fn last_buy(&self) -> Option<usize> {
        self.buys.last().copied()
    }

    pub fn last_sell(&self) -> Option<usize> {
        self.sells.last().copied()
    }

    pub fn last(&self, direction: Direction) -> Option<usize> {
        match direction {
            Direction::Buy => self.last_buy(),
            Direction::Sell => self.last_sell(),
        }
    }

    /// Both directions merged and ordered by index.
    pub fn events(&self) -> Vec<CrossoverEvent> {
        let mut out: Vec<CrossoverEvent> = self
            .buys
            .iter()
            .map(|&index| CrossoverEvent {
                index,
                direction: Direction::Buy,
            })
            .chain(self.sells.iter().map(|&index| CrossoverEvent {
                index,
                direction: Direction::Sell,
            }))
            .collect();
        out.sort_by_key(|e| e.index);
        out
    }

    pub fn is_empty(&self) -> bool {
        self.buys.is_empty() && self.sells.is_empty()
    }
}

/// Runs the buy and sell passes over two aligned series.
///
/// Positions where either side is `None` are skipped. If the series differ in
/// length only the common prefix is evaluated.
pub fn detect_crossovers(short: &[Option<f64>], long: &[Option<f64>]) -> Crossovers {
    Crossovers {
        buys: scan(short, long, Direction::Buy),
        sells: scan(short, long, Direction::Sell),
    }
}

fn scan(short: &[Option<f64>], long: &[Option<f64>], direction: Direction) -> Vec<usize> {
    let mut armed = true;
    let mut points = Vec::new();

    for (i, (s, l)) in short.iter().zip(long).enumerate() {
        let (Some(s), Some(l)) = (*s, *l) else {
            continue;
        };

        let (rearm, fire) = match direction {
            Direction::Buy => (l < s, l > s),
            Direction::Sell => (l > s, l < s),
        };

        if rearm {
            armed = true;
        }

        if armed && fire {
            points.push(i);
            armed = false;
        }
    }

    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn some(v: &[f64]) -> Vec<Option<f64>> {
        v.iter().copied().map(Some).collect()
    }

    #[test]
    fn first_observation_fires_when_latch_starts_armed() {
        let short = some(&[1.0, 1.0]);
        let long = some(&[2.0, 2.0]);

        let x = detect_crossovers(&short, &long);
        assert_eq!(x.buys, vec![0]);
        assert!(x.sells.is_empty());
    }

    #[test]
    fn does_not_refire_while_trend_persists() {
        let short = some(&[5.0, 5.0, 5.0, 5.0]);
        let long = some(&[6.0, 7.0, 8.0, 9.0]);

        let x = detect_crossovers(&short, &long);
        assert_eq!(x.buys, vec![0]);
    }

    #[test]
    fn rearms_after_opposite_side_is_seen() {
        // long - short: +, -, +, =, +, -
        let short = some(&[1.0, 3.0, 1.0, 2.0, 1.0, 3.0]);
        let long = some(&[2.0, 2.0, 2.0, 2.0, 2.0, 2.0]);

        let x = detect_crossovers(&short, &long);
        assert_eq!(x.buys, vec![0, 2]);
        assert_eq!(x.sells, vec![1, 5]);
        assert_eq!(x.last_buy(), Some(2));
        assert_eq!(x.last_sell(), Some(5));
    }

    #[test]
    fn equality_neither_fires_nor_rearms() {
        // +, =, + : equality between two "above" samples must not re-arm
        let short = some(&[1.0, 2.0, 1.0]);
        let long = some(&[2.0, 2.0, 2.0]);

        let x = detect_crossovers(&short, &long);
        assert_eq!(x.buys, vec![0]);
        assert!(x.sells.is_empty());
    }

    #[test]
    fn warm_up_entries_are_skipped() {
        let short = vec![Some(1.0), Some(1.0), Some(3.0), Some(1.0)];
        let long = vec![None, None, Some(2.0), Some(2.0)];

        let x = detect_crossovers(&short, &long);
        assert_eq!(x.sells, vec![2]);
        assert_eq!(x.buys, vec![3]);
    }

    #[test]
    fn no_crossover_yields_empty_lookups() {
        let x = detect_crossovers(&[None, None], &[None, None]);
        assert!(x.is_empty());
        assert_eq!(x.last(Direction::Buy), None);
        assert_eq!(x.last(Direction::Sell), None);
    }

    #[test]
    fn mismatched_lengths_use_common_prefix() {
        let short = some(&[1.0, 3.0, 1.0]);
        let long = some(&[2.0]);

        let x = detect_crossovers(&short, &long);
        assert_eq!(x.buys, vec![0]);
        assert!(x.sells.is_empty());
    }

    #[test]
    fn events_are_merged_in_index_order() {
        let short = some(&[1.0, 3.0, 1.0]);
        let long = some(&[2.0, 2.0, 2.0]);

        let events = detect_crossovers(&short, &long).events();
        let order: Vec<_> = events.iter().map(|e| (e.index, e.direction)).collect();
        assert_eq!(
            order,
            vec![
                (0, Direction::Buy),
                (1, Direction::Sell),
                (2, Direction::Buy)
            ]
        );
    }

    proptest! {
        #[test]
        fn consecutive_fires_need_an_opposite_observation(
            pairs in prop::collection::vec((1u8..6, 1u8..6), 0..80),
        ) {
            let short: Vec<Option<f64>> = pairs.iter().map(|(s, _)| Some(*s as f64)).collect();
            let long: Vec<Option<f64>> = pairs.iter().map(|(_, l)| Some(*l as f64)).collect();
            let x = detect_crossovers(&short, &long);

            for w in x.buys.windows(2) {
                let rearmed = (w[0] + 1..w[1]).any(|j| long[j] < short[j]);
                prop_assert!(rearmed, "buy at {} and {} without re-arm", w[0], w[1]);
            }
            for w in x.sells.windows(2) {
                let rearmed = (w[0] + 1..w[1]).any(|j| long[j] > short[j]);
                prop_assert!(rearmed, "sell at {} and {} without re-arm", w[0], w[1]);
            }
        }
    }
}
