//! Per-call capability hooks: store transform, comparator, raiser.
//!
//! Each hook is either the default behavior or a caller-supplied override.
//! Defaults: identity transform, [`compare::compare`], and the store's
//! `raise_if_different`.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use serde_json::Value;

use crate::compare::{self, CompareResult};
use crate::store::RecordStore;
use crate::value::SnapValue;

pub type TransformFn = Arc<dyn Fn(SnapValue) -> Result<SnapValue> + Send + Sync>;
pub type CompareFn = Arc<dyn Fn(&Value, &SnapValue) -> CompareResult + Send + Sync>;
pub type RaiseFn = Arc<dyn Fn(&Mismatch<'_>) -> Result<()> + Send + Sync>;

/// Default or overridden behavior for one hook.
#[derive(Clone)]
pub enum Hook<F> {
    Default,
    Custom(F),
}

impl<F> Default for Hook<F> {
    fn default() -> Self {
        Hook::Default
    }
}

impl<F> fmt::Debug for Hook<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Hook::Default => f.write_str("Default"),
            Hook::Custom(_) => f.write_str("Custom"),
        }
    }
}

/// What the raiser gets when a baseline does not match.
#[derive(Debug)]
pub struct Mismatch<'a> {
    /// Source file the snapshot belongs to.
    pub file: &'a Path,
    pub spec: &'a str,
    pub key: &'a str,
    pub expected: &'a Value,
    pub value: &'a SnapValue,
    /// Comparator diagnostic.
    pub message: &'a str,
}

#[derive(Clone, Debug, Default)]
pub struct Hooks {
    pub transform: Hook<TransformFn>,
    pub compare: Hook<CompareFn>,
    pub raise: Hook<RaiseFn>,
}

impl Hooks {
    pub fn transform(&self, value: SnapValue) -> Result<SnapValue> {
        match &self.transform {
            Hook::Default => Ok(value),
            Hook::Custom(f) => f(value),
        }
    }

    pub fn compare(&self, expected: &Value, value: &SnapValue) -> CompareResult {
        match &self.compare {
            Hook::Default => compare::compare(expected, value),
            Hook::Custom(f) => f(expected, value),
        }
    }

    pub fn raise(&self, store: &dyn RecordStore, mismatch: &Mismatch<'_>) -> Result<()> {
        match &self.raise {
            Hook::Default => store.raise_if_different(mismatch),
            Hook::Custom(f) => f(mismatch),
        }
    }
}
