//! Per-test snapshot counters.
//!
//! Each non-exact snapshot call for a test takes the next 1-based index, so
//! repeated calls inside one test get stable keys `"<test> 1"`, `"<test> 2"`, ...
//! The registry also remembers every snapshot resolved during the run, along
//! with the extension and path mode that locate its snapshot file. Pruning
//! consumes that list at the end.
//!
//! State lives in memory only. Reset between independent runs.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use log::debug;

use crate::prune::UsedSnapshot;

#[derive(Default)]
struct CounterState {
    counts: HashMap<String, u32>,
    used: Vec<UsedSnapshot>,
    seen: HashSet<UsedSnapshot>,
}

/// Owned, injectable counter registry. Share it with `Arc` between engines
/// that must agree on indices; give independent suites their own.
#[derive(Default)]
pub struct CounterRegistry {
    inner: Mutex<CounterState>,
}

impl CounterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, CounterState> {
        // Counters stay usable after a panicking test poisoned the lock.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Increment and return the 1-based index for `spec`.
    pub fn next_index(&self, spec: &str) -> u32 {
        let mut st = self.state();
        let n = st.counts.entry(spec.to_string()).or_insert(0);
        *n += 1;
        *n
    }

    /// Calls seen so far for `spec` (0 if none).
    pub fn current(&self, spec: &str) -> u32 {
        self.state().counts.get(spec).copied().unwrap_or(0)
    }

    /// Forget all counters and used keys.
    pub fn reset_all(&self) {
        debug!("restoring all counters");
        let mut st = self.state();
        st.counts.clear();
        st.used.clear();
        st.seen.clear();
    }

    /// Forget the counter of one test only.
    pub fn reset_one(&self, spec: &str) {
        debug!("restoring counter for test \"{}\"", spec);
        self.state().counts.remove(spec);
    }

    /// Record a snapshot produced by the current run.
    pub fn mark_used(&self, used: UsedSnapshot) {
        let mut st = self.state();
        if st.seen.insert(used.clone()) {
            st.used.push(used);
        }
    }

    /// Used snapshots in first-seen order.
    pub fn used_snapshots(&self) -> Vec<UsedSnapshot> {
        self.state().used.clone()
    }
}
