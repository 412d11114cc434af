use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Minimal counters for operational visibility.
#[derive(Clone, Default)]
pub struct Counters {
    pub cycles: Arc<AtomicU64>,
    pub cycle_failures: Arc<AtomicU64>,

    pub alerts_emitted: Arc<AtomicU64>,
    pub deliveries_ok: Arc<AtomicU64>,
    pub deliveries_failed: Arc<AtomicU64>,

    // state store
    pub state_saves: Arc<AtomicU64>,
    pub state_save_failures: Arc<AtomicU64>,
    pub state_load_fallbacks: Arc<AtomicU64>,
}

impl Counters {
    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add(counter: &AtomicU64, n: usize) {
        counter.fetch_add(n as u64, Ordering::Relaxed);
    }

    pub fn get(counter: &AtomicU64) -> u64 {
        counter.load(Ordering::Relaxed)
    }
}
