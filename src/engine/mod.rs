//! Snapshot engine split into submodules:
//! - call.rs: SnapshotCall builder and synchronous validation.
//! - decide.rs: key resolution, lookup, first write / CI guard, compare / raise.
//!
//! Per call:
//! START -> (await if pending) -> KEY -> LOOKUP
//!   -> NOT FOUND -> CI BLOCK | WRITE -> RETURN
//!   -> FOUND -> COMPARE -> MATCH -> RETURN | MISMATCH -> RAISE

use anyhow::Result;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;

use crate::config::SnapConfig;
use crate::counters::CounterRegistry;
use crate::error::SnapError;
use crate::prune::{self, PruneReport};
use crate::store::{LoadOptions, RecordStore, Records};
use crate::value::SnapInput;

mod call;
mod decide;

pub use call::SnapshotCall;
pub use decide::form_key;

pub type PendingEvaluation = Pin<Box<dyn Future<Output = Result<Value>> + Send + 'static>>;

/// Result of a validated call: decided already, or waiting on a deferred value.
pub enum Evaluation {
    Ready(Value),
    Pending(PendingEvaluation),
}

impl Evaluation {
    pub fn is_pending(&self) -> bool {
        matches!(self, Evaluation::Pending(_))
    }

    /// Drive the evaluation to its value (no-op for `Ready`).
    pub async fn resolve(self) -> Result<Value> {
        match self {
            Evaluation::Ready(v) => Ok(v),
            Evaluation::Pending(fut) => fut.await,
        }
    }
}

impl fmt::Debug for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Evaluation::Ready(v) => f.debug_tuple("Ready").field(v).finish(),
            Evaluation::Pending(_) => f.write_str("Pending(..)"),
        }
    }
}

/// Records values on first sight and compares later values against them.
///
/// Owns its counter registry (shareable via `with_counters`) and talks to
/// storage only through `RecordStore`.
pub struct SnapshotEngine {
    store: Arc<dyn RecordStore>,
    counters: Arc<CounterRegistry>,
    config: SnapConfig,
}

impl SnapshotEngine {
    /// Engine with options taken from the environment (CI detection etc.).
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self::with_config(store, SnapConfig::from_env())
    }

    pub fn with_config(store: Arc<dyn RecordStore>, config: SnapConfig) -> Self {
        Self {
            store,
            counters: Arc::new(CounterRegistry::new()),
            config,
        }
    }

    /// Use a shared counter registry instead of a private one.
    pub fn with_counters(mut self, counters: Arc<CounterRegistry>) -> Self {
        self.counters = counters;
        self
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    pub fn counters(&self) -> &Arc<CounterRegistry> {
        &self.counters
    }

    pub fn config(&self) -> &SnapConfig {
        &self.config
    }

    /// Forget all per-test counters and used keys (new run).
    pub fn reset_all(&self) {
        self.counters.reset_all();
    }

    /// Forget the counter of one test (e.g. a retried test).
    pub fn reset_one(&self, spec: &str) {
        self.counters.reset_one(spec);
    }

    /// Validate `call` and evaluate it.
    ///
    /// Invalid calls fail here, synchronously, even when the value is pending.
    /// An immediate value is decided before returning; a pending one yields
    /// `Evaluation::Pending`, which awaits the value once and then decides.
    pub fn evaluate(&self, call: SnapshotCall) -> Result<Evaluation> {
        let (input, resolved) = call.validate(&self.config)?;
        match input {
            SnapInput::Immediate(value) => {
                let v = decide::set_or_check(self.store.as_ref(), &self.counters, &resolved, value)?;
                Ok(Evaluation::Ready(v))
            }
            SnapInput::Pending(fut) => {
                let store = Arc::clone(&self.store);
                let counters = Arc::clone(&self.counters);
                Ok(Evaluation::Pending(Box::pin(async move {
                    let value = fut.await?;
                    decide::set_or_check(store.as_ref(), &counters, &resolved, value)
                })))
            }
        }
    }

    /// Synchronous form for immediate values.
    pub fn check(&self, call: SnapshotCall) -> Result<Value> {
        match self.evaluate(call)? {
            Evaluation::Ready(v) => Ok(v),
            Evaluation::Pending(_) => Err(SnapError::invalid(
                "deferred value: use evaluate(..)?.resolve().await",
            )
            .into()),
        }
    }

    /// Async form; awaits a pending value if needed.
    pub async fn check_async(&self, call: SnapshotCall) -> Result<Value> {
        self.evaluate(call)?.resolve().await
    }

    /// Prune every snapshot file touched in this run down to the keys used in this run.
    pub fn prune_unused(&self) -> Result<PruneReport> {
        let used = self.counters.used_snapshots();
        prune::prune_snapshots(self.store.as_ref(), &used, &self.config)
    }

    /// Load the current record mapping of `file` (diagnostics/tests).
    pub fn records(&self, file: &Path, ext: &str) -> Result<Option<Records>> {
        self.store
            .load_records(file, ext, LoadOptions::from(&self.config))
    }
}
