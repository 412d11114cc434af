//! One poll cycle: fetch → averages → crossovers → dedup → notify → persist.

use std::sync::Arc;
use std::time::Duration;

use common::logger::{TraceId, annotate_symbol, cycle_span, warn_if_slow};
use common::time::now_ms;
use market::{Direction, MaCrossover, PricePoint};
use tokio::sync::Mutex;
use tracing::{Instrument, debug, error, info, warn};

use crate::config::FirstRunPolicy;
use crate::error::PipelineError;
use crate::market::PriceSource;
use crate::metrics::counters::Counters;
use crate::notify::{DeliveryReport, SignalAlert, SignalNotifier};
use crate::signal_state::{DedupState, SignalStateStore};

const STATE_SLOW: Duration = Duration::from_millis(100);

/// What a single cycle did.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub trace_id: TraceId,
    pub points: usize,
    /// Alerts emitted this cycle, in buy-then-sell order.
    pub alerts: Vec<(SignalAlert, DeliveryReport)>,
    /// State after the cycle (persisted or not).
    pub state: DedupState,
    pub state_persisted: bool,
    pub state_persist_failed: bool,
    /// No usable stored state was found and the first-run policy was applied.
    pub used_default_state: bool,
    /// The store failed to load. Nothing is written back on such a cycle.
    pub state_unreadable: bool,
}

impl CycleReport {
    pub fn alert(&self, direction: Direction) -> Option<&SignalAlert> {
        self.alerts
            .iter()
            .map(|(a, _)| a)
            .find(|a| a.direction == direction)
    }
}

/// Where the cycle's starting state came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StateOrigin {
    Stored,
    FirstRun,
    Unreadable,
}

pub struct SignalPipeline {
    symbol: String,
    signal: MaCrossover,
    prices: Arc<dyn PriceSource>,
    state: Arc<dyn SignalStateStore>,
    notifier: Arc<dyn SignalNotifier>,
    first_run: FirstRunPolicy,
    counters: Counters,
    // at most one cycle in flight
    cycle_lock: Mutex<()>,
}

impl SignalPipeline {
    pub fn new(
        symbol: impl Into<String>,
        signal: MaCrossover,
        prices: Arc<dyn PriceSource>,
        state: Arc<dyn SignalStateStore>,
        notifier: Arc<dyn SignalNotifier>,
        first_run: FirstRunPolicy,
        counters: Counters,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            signal,
            prices,
            state,
            notifier,
            first_run,
            counters,
            cycle_lock: Mutex::new(()),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn counters(&self) -> &Counters {
        &self.counters
    }

    /// Runs one cycle to completion.
    ///
    /// Overlapping callers are serialised so a cycle never reads state that
    /// another in-flight cycle is about to overwrite.
    pub async fn run_cycle(&self) -> Result<CycleReport, PipelineError> {
        let _guard = self.cycle_lock.lock().await;

        let trace_id = TraceId::default();
        let span = cycle_span("signal_cycle", &trace_id);

        Counters::bump(&self.counters.cycles);

        let res = self.cycle(trace_id).instrument(span).await;
        if res.is_err() {
            Counters::bump(&self.counters.cycle_failures);
        }
        res
    }

    async fn cycle(&self, trace_id: TraceId) -> Result<CycleReport, PipelineError> {
        annotate_symbol(&self.symbol);

        let series = self.prices.fetch_series(&self.symbol).await?;
        let Some(latest) = series.last() else {
            return Err(PipelineError::EmptySeries {
                symbol: self.symbol.clone(),
            });
        };

        let snapshot = self.signal.evaluate(&series);
        debug!(
            points = series.len(),
            latest_age_ms = now_ms() - latest.timestamp_ms,
            buys = snapshot.crossovers.buys.len(),
            sells = snapshot.crossovers.sells.len(),
            "crossovers computed"
        );

        let (stored, origin) = self.load_state(latest).await;
        let used_default_state = origin != StateOrigin::Stored;
        let state_unreadable = origin == StateOrigin::Unreadable;
        let mut next = stored;
        let mut alerts = Vec::new();

        for direction in [Direction::Buy, Direction::Sell] {
            let Some(point) = snapshot.latest(direction, &series) else {
                debug!(%direction, "no crossover in window");
                continue;
            };

            if !next.advance(direction, point.timestamp_ms) {
                debug!(
                    %direction,
                    ts_ms = point.timestamp_ms,
                    last_notified_ms = next.last(direction),
                    "crossover already notified"
                );
                continue;
            }

            let alert = self.alert_for(direction, point);
            info!(
                %direction,
                price = alert.price,
                ts_ms = alert.timestamp_ms,
                "new crossover"
            );

            let report = self.notifier.notify(&alert).await;
            Counters::bump(&self.counters.alerts_emitted);
            Counters::add(&self.counters.deliveries_ok, report.delivered);
            Counters::add(&self.counters.deliveries_failed, report.failed);

            alerts.push((alert, report));
        }

        // A seeded default is new state even with no alert; an epoch default
        // is indistinguishable from nothing stored. After a failed load the
        // durable thresholds are unknown, so they are never overwritten.
        let changed = match origin {
            StateOrigin::Stored => next != stored,
            StateOrigin::FirstRun => next != DedupState::default(),
            StateOrigin::Unreadable => false,
        };
        let mut state_persisted = false;
        let mut state_persist_failed = false;

        if state_unreadable && next != stored {
            warn!(
                last_buy_ts_ms = next.last_buy_ts_ms,
                last_sell_ts_ms = next.last_sell_ts_ms,
                "signal state unreadable; not persisting this cycle"
            );
        }

        if changed {
            match warn_if_slow("signal_state_save", STATE_SLOW, self.state.save(&next)).await {
                Ok(()) => {
                    state_persisted = true;
                    Counters::bump(&self.counters.state_saves);
                    debug!(
                        last_buy_ts_ms = next.last_buy_ts_ms,
                        last_sell_ts_ms = next.last_sell_ts_ms,
                        "signal state persisted"
                    );
                }
                Err(e) => {
                    // notifications already sent stay sent
                    state_persist_failed = true;
                    Counters::bump(&self.counters.state_save_failures);
                    error!(error = ?e, "failed to persist signal state");
                }
            }
        }

        Ok(CycleReport {
            trace_id,
            points: series.len(),
            alerts,
            state: next,
            state_persisted,
            state_persist_failed,
            used_default_state,
            state_unreadable,
        })
    }

    /// Loads stored state, falling back to the first-run policy when nothing
    /// usable is stored. Never fails the cycle.
    async fn load_state(&self, latest: &PricePoint) -> (DedupState, StateOrigin) {
        match warn_if_slow("signal_state_load", STATE_SLOW, self.state.load()).await {
            Ok(Some(state)) => (state, StateOrigin::Stored),
            Ok(None) => {
                let state = self.default_state(latest);
                info!(
                    policy = ?self.first_run,
                    last_buy_ts_ms = state.last_buy_ts_ms,
                    last_sell_ts_ms = state.last_sell_ts_ms,
                    "no stored signal state; applying first-run policy"
                );
                (state, StateOrigin::FirstRun)
            }
            Err(e) => {
                Counters::bump(&self.counters.state_load_fallbacks);
                let state = self.default_state(latest);
                warn!(
                    error = ?e,
                    policy = ?self.first_run,
                    "signal state unreadable; applying first-run policy"
                );
                (state, StateOrigin::Unreadable)
            }
        }
    }

    fn default_state(&self, latest: &PricePoint) -> DedupState {
        match self.first_run {
            FirstRunPolicy::SeedFromLatest => DedupState::seeded(latest.timestamp_ms),
            FirstRunPolicy::NotifyHistory => DedupState::default(),
        }
    }

    fn alert_for(&self, direction: Direction, point: &PricePoint) -> SignalAlert {
        SignalAlert {
            symbol: self.symbol.clone(),
            direction,
            price: point.close,
            timestamp_ms: point.timestamp_ms,
        }
    }
}
