//! Lightweight global metrics for snapshot evaluation.
//!
//! Thread-safe atomic counters:
//! - engine outcomes (saved / matched / mismatched / CI-blocked)
//! - pruning

use std::sync::atomic::{AtomicU64, Ordering};

// ----- Engine -----
static SNAPSHOTS_SAVED: AtomicU64 = AtomicU64::new(0);
static SNAPSHOTS_MATCHED: AtomicU64 = AtomicU64::new(0);
static SNAPSHOTS_MISMATCHED: AtomicU64 = AtomicU64::new(0);
static CI_BLOCKED: AtomicU64 = AtomicU64::new(0);

// ----- Prune -----
static KEYS_PRUNED: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub snapshots_saved: u64,
    pub snapshots_matched: u64,
    pub snapshots_mismatched: u64,
    pub ci_blocked: u64,
    pub keys_pruned: u64,
}

impl MetricsSnapshot {
    /// Evaluations that reached a decision.
    pub fn evaluations(&self) -> u64 {
        self.snapshots_saved + self.snapshots_matched + self.snapshots_mismatched + self.ci_blocked
    }
}

// ----- Recorders -----
pub fn record_saved() {
    SNAPSHOTS_SAVED.fetch_add(1, Ordering::Relaxed);
}

pub fn record_matched() {
    SNAPSHOTS_MATCHED.fetch_add(1, Ordering::Relaxed);
}

pub fn record_mismatched() {
    SNAPSHOTS_MISMATCHED.fetch_add(1, Ordering::Relaxed);
}

pub fn record_ci_blocked() {
    CI_BLOCKED.fetch_add(1, Ordering::Relaxed);
}

pub fn record_keys_pruned(n: usize) {
    KEYS_PRUNED.fetch_add(n as u64, Ordering::Relaxed);
}

// ----- Snapshot / Reset -----
pub fn snapshot() -> MetricsSnapshot {
    MetricsSnapshot {
        snapshots_saved: SNAPSHOTS_SAVED.load(Ordering::Relaxed),
        snapshots_matched: SNAPSHOTS_MATCHED.load(Ordering::Relaxed),
        snapshots_mismatched: SNAPSHOTS_MISMATCHED.load(Ordering::Relaxed),
        ci_blocked: CI_BLOCKED.load(Ordering::Relaxed),
        keys_pruned: KEYS_PRUNED.load(Ordering::Relaxed),
    }
}

pub fn reset() {
    SNAPSHOTS_SAVED.store(0, Ordering::Relaxed);
    SNAPSHOTS_MATCHED.store(0, Ordering::Relaxed);
    SNAPSHOTS_MISMATCHED.store(0, Ordering::Relaxed);
    CI_BLOCKED.store(0, Ordering::Relaxed);
    KEYS_PRUNED.store(0, Ordering::Relaxed);
}
