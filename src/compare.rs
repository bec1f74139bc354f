//! Default comparator: strict equality of compact JSON forms.
//!
//! Key order and number representation matter (`{"a":1,"b":2}` differs from
//! `{"b":2,"a":1}`, `1` differs from `1.0`). Callers that need a looser
//! comparison install their own compare hook.

use serde_json::Value;

use crate::value::{serialize_compact, SnapValue};

/// `Ok(())` when equal, otherwise a diagnostic message `<expected> !== <value>`.
pub type CompareResult = std::result::Result<(), String>;

/// Compare a stored baseline against a normalized value.
pub fn compare(expected: &Value, value: &SnapValue) -> CompareResult {
    let e = serialize_compact(expected);
    let v = value.serialized();
    if e == v {
        Ok(())
    } else {
        Err(format!("{} !== {}", e, v))
    }
}

/// Convenience form for two plain values.
pub fn compare_values(expected: &Value, value: &Value) -> CompareResult {
    let e = serialize_compact(expected);
    let v = serialize_compact(value);
    if e == v {
        Ok(())
    } else {
        Err(format!("{} !== {}", e, v))
    }
}
