use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Result;
use serde_json::json;

use snapcore::{MemoryStore, SnapConfig, SnapError, SnapValue, SnapshotCall, SnapshotEngine};

fn engine() -> SnapshotEngine {
    SnapshotEngine::with_config(Arc::new(MemoryStore::default()), SnapConfig::default())
}

fn seed(eng: &SnapshotEngine, file: &str, key: &str, value: serde_json::Value) -> Result<()> {
    eng.check(SnapshotCall::new().file(file).exact(key).value(value))?;
    Ok(())
}

#[test]
fn default_raiser_reports_both_forms_and_diff() -> Result<()> {
    let eng = engine();
    seed(&eng, "/spec.rs", "user", json!({"name": "ann", "age": 30}))?;

    let err = eng
        .check(
            SnapshotCall::new()
                .file("/spec.rs")
                .exact("user")
                .value(json!({"name": "ann", "age": 31})),
        )
        .unwrap_err();

    match SnapError::find(&err) {
        Some(SnapError::Mismatch { file, spec, key, message, diff }) => {
            assert_eq!(file, "/spec.rs");
            assert_eq!(spec, "user");
            assert_eq!(key, "user");
            assert!(message.contains(r#"{"name":"ann","age":30}"#), "{message}");
            assert!(message.contains(r#"{"name":"ann","age":31}"#), "{message}");
            assert!(diff.contains("-   \"age\": 30"), "{diff}");
            assert!(diff.contains("+   \"age\": 31"), "{diff}");
        }
        other => panic!("unexpected error: {:?}", other),
    }
    Ok(())
}

#[test]
fn key_order_change_is_a_mismatch() -> Result<()> {
    let eng = engine();
    seed(&eng, "/spec.rs", "k", json!({"a": 1, "b": 2}))?;

    let reordered: serde_json::Value = serde_json::from_str(r#"{"b":2,"a":1}"#)?;
    let err = eng
        .check(SnapshotCall::new().file("/spec.rs").exact("k").value(reordered))
        .unwrap_err();
    assert!(matches!(SnapError::find(&err), Some(SnapError::Mismatch { .. })));
    Ok(())
}

#[test]
fn non_failing_raiser_returns_expected() -> Result<()> {
    let eng = engine();
    seed(&eng, "/spec.rs", "k", json!("old"))?;

    let calls = Arc::new(AtomicUsize::new(0));
    let seen = calls.clone();
    let out = eng.check(
        SnapshotCall::new()
            .file("/spec.rs")
            .exact("k")
            .value("new")
            .raise(move |m| {
                assert_eq!(m.file, Path::new("/spec.rs"));
                assert_eq!(m.key, "k");
                assert_eq!(m.expected, &json!("old"));
                assert_eq!(m.value, &SnapValue::text("new"));
                assert_eq!(m.message, r#""old" !== "new""#);
                seen.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }),
    )?;

    assert_eq!(out, json!("old"));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    // baseline untouched
    let records = eng.records(Path::new("/spec.rs"), ".snapshot.js")?.expect("file exists");
    assert_eq!(records["k"], json!("old"));
    Ok(())
}

#[test]
fn raiser_is_not_called_on_match() -> Result<()> {
    let eng = engine();
    seed(&eng, "/spec.rs", "k", json!(7))?;

    let out = eng.check(
        SnapshotCall::new()
            .file("/spec.rs")
            .exact("k")
            .value(json!(7))
            .raise(|_| panic!("raiser called on a match")),
    )?;
    assert_eq!(out, json!(7));
    Ok(())
}

#[test]
fn custom_comparator_decides_match() -> Result<()> {
    let eng = engine();
    seed(&eng, "/spec.rs", "len", json!("abc"))?;

    // Only lengths must agree.
    let same_len = |expected: &serde_json::Value, value: &SnapValue| {
        let e = expected.as_str().map(str::len);
        let v = value.as_data().and_then(|v| v.as_str()).map(str::len);
        if e == v {
            Ok(())
        } else {
            Err(format!("length {:?} !== {:?}", e, v))
        }
    };

    let out = eng.check(
        SnapshotCall::new()
            .file("/spec.rs")
            .exact("len")
            .value("xyz")
            .compare(same_len),
    )?;
    assert_eq!(out, json!("abc"));

    let err = eng
        .check(
            SnapshotCall::new()
                .file("/spec.rs")
                .exact("len")
                .value("wxyz")
                .compare(same_len),
        )
        .unwrap_err();
    match SnapError::find(&err) {
        Some(SnapError::Mismatch { message, .. }) => {
            assert_eq!(message, "length Some(3) !== Some(4)")
        }
        other => panic!("unexpected error: {:?}", other),
    }
    Ok(())
}

#[test]
fn raiser_error_propagates_as_is() -> Result<()> {
    let eng = engine();
    seed(&eng, "/spec.rs", "k", json!(1))?;

    let err = eng
        .check(
            SnapshotCall::new()
                .file("/spec.rs")
                .exact("k")
                .value(json!(2))
                .raise(|m| Err(anyhow::anyhow!("custom failure for {}", m.key))),
        )
        .unwrap_err();
    assert_eq!(err.to_string(), "custom failure for k");
    Ok(())
}

#[test]
fn derived_key_and_file_appear_in_message() -> Result<()> {
    let eng = engine();
    eng.check(SnapshotCall::new().file("/suite/login.rs").spec("t").value(json!(1)))?;
    eng.check(SnapshotCall::new().file("/suite/login.rs").spec("t").value(json!("a")))?;

    eng.reset_all();
    eng.check(SnapshotCall::new().file("/suite/login.rs").spec("t").value(json!(1)))?;
    let err = eng
        .check(SnapshotCall::new().file("/suite/login.rs").spec("t").value(json!("b")))
        .unwrap_err();

    let msg = err.to_string();
    assert!(msg.contains("snapshot mismatch for 't'"), "{msg}");
    assert!(msg.contains("test key 't 2'"), "{msg}");
    assert!(msg.contains("in '/suite/login.rs'"), "{msg}");
    assert!(msg.contains(r#""a" !== "b""#), "{msg}");
    Ok(())
}
