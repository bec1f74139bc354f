//! Snapshot values and the value normalizer.
//!
//! A value to check is either structural data (`serde_json::Value`, text is a
//! JSON string) or a function value. Data is normalized by a full
//! serialize -> deserialize round trip; function values pass through as-is.
//!
//! The input of one evaluation can be deferred: `SnapInput::Pending` wraps a
//! future that is awaited exactly once before the engine decides anything.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;

type FnBody = dyn Fn(&Value) -> Value + Send + Sync;

/// Named function value. Compared by reference.
#[derive(Clone)]
pub struct SnapFn {
    name: String,
    body: Arc<FnBody>,
}

impl SnapFn {
    pub fn new<S, F>(name: S, body: F) -> Self
    where
        S: Into<String>,
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            body: Arc::new(body),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, arg: &Value) -> Value {
        (self.body)(arg)
    }

    pub fn ptr_eq(&self, other: &SnapFn) -> bool {
        Arc::ptr_eq(&self.body, &other.body)
    }
}

impl fmt::Debug for SnapFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[Function: {}]", self.name)
    }
}

/// Content of one snapshot call.
#[derive(Clone, Debug)]
pub enum SnapValue {
    Data(Value),
    Function(SnapFn),
}

impl SnapValue {
    /// Serialize any value into snapshot data (normalized).
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        Ok(SnapValue::Data(round_trip(value)?))
    }

    pub fn text<S: Into<String>>(s: S) -> Self {
        SnapValue::Data(Value::String(s.into()))
    }

    pub fn function<S, F>(name: S, body: F) -> Self
    where
        S: Into<String>,
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        SnapValue::Function(SnapFn::new(name, body))
    }

    pub fn as_data(&self) -> Option<&Value> {
        match self {
            SnapValue::Data(v) => Some(v),
            SnapValue::Function(_) => None,
        }
    }

    pub fn into_data(self) -> Option<Value> {
        match self {
            SnapValue::Data(v) => Some(v),
            SnapValue::Function(_) => None,
        }
    }

    /// Compact serialized form used by the default comparator.
    /// Function values have no serialized form and render as `undefined`.
    pub fn serialized(&self) -> String {
        match self {
            SnapValue::Data(v) => serialize_compact(v),
            SnapValue::Function(_) => "undefined".to_string(),
        }
    }

    /// Pretty form used for diffs and `show` output.
    pub fn pretty(&self) -> String {
        match self {
            SnapValue::Data(v) => serialize_pretty(v),
            SnapValue::Function(_) => "undefined".to_string(),
        }
    }
}

impl PartialEq for SnapValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (SnapValue::Data(a), SnapValue::Data(b)) => a == b,
            (SnapValue::Function(a), SnapValue::Function(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl From<Value> for SnapValue {
    fn from(v: Value) -> Self {
        SnapValue::Data(v)
    }
}

impl From<&str> for SnapValue {
    fn from(s: &str) -> Self {
        SnapValue::text(s)
    }
}

impl From<String> for SnapValue {
    fn from(s: String) -> Self {
        SnapValue::text(s)
    }
}

impl From<SnapFn> for SnapValue {
    fn from(f: SnapFn) -> Self {
        SnapValue::Function(f)
    }
}

pub(crate) fn serialize_compact(v: &Value) -> String {
    // Value -> String cannot fail (keys are strings, no custom Serialize impls).
    serde_json::to_string(v).unwrap_or_else(|_| "undefined".to_string())
}

pub(crate) fn serialize_pretty(v: &Value) -> String {
    serde_json::to_string_pretty(v).unwrap_or_else(|_| "undefined".to_string())
}

fn round_trip<T: Serialize + ?Sized>(value: &T) -> Result<Value> {
    let s = serde_json::to_string(value).context("serialize snapshot value")?;
    let v: Value = serde_json::from_str(&s).context("deserialize snapshot value")?;
    Ok(v)
}

/// Normalize a value for storage and comparison.
///
/// Data goes through a serialize -> deserialize cycle and comes back as a
/// fresh copy with only serializable structure; functions are returned unchanged.
pub fn normalize(value: &SnapValue) -> Result<SnapValue> {
    match value {
        SnapValue::Function(_) => Ok(value.clone()),
        SnapValue::Data(v) => Ok(SnapValue::Data(round_trip(v)?)),
    }
}

pub type PendingValue = Pin<Box<dyn Future<Output = Result<SnapValue>> + Send + 'static>>;

/// Value handed to the engine: already available, or produced later.
pub enum SnapInput {
    Immediate(SnapValue),
    Pending(PendingValue),
}

impl SnapInput {
    pub fn pending<F>(fut: F) -> Self
    where
        F: Future<Output = Result<SnapValue>> + Send + 'static,
    {
        SnapInput::Pending(Box::pin(fut))
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, SnapInput::Pending(_))
    }
}

impl fmt::Debug for SnapInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapInput::Immediate(v) => f.debug_tuple("Immediate").field(v).finish(),
            SnapInput::Pending(_) => f.write_str("Pending(..)"),
        }
    }
}

impl From<SnapValue> for SnapInput {
    fn from(v: SnapValue) -> Self {
        SnapInput::Immediate(v)
    }
}

impl From<Value> for SnapInput {
    fn from(v: Value) -> Self {
        SnapInput::Immediate(SnapValue::Data(v))
    }
}

impl From<&str> for SnapInput {
    fn from(s: &str) -> Self {
        SnapInput::Immediate(SnapValue::text(s))
    }
}

impl From<String> for SnapInput {
    fn from(s: String) -> Self {
        SnapInput::Immediate(SnapValue::text(s))
    }
}
