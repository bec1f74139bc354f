use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use serde_json::json;

use snapcore::{MemoryStore, SnapConfig, SnapError, SnapInput, SnapValue, SnapshotCall, SnapshotEngine};

fn engine() -> SnapshotEngine {
    SnapshotEngine::with_config(Arc::new(MemoryStore::default()), SnapConfig::default())
}

fn later(v: serde_json::Value) -> SnapInput {
    SnapInput::pending(async move {
        tokio::time::sleep(Duration::from_millis(5)).await;
        Ok::<_, anyhow::Error>(SnapValue::Data(v))
    })
}

#[tokio::test]
async fn pending_value_is_recorded_like_an_immediate_one() -> Result<()> {
    let eng = engine();

    let ev = eng.evaluate(SnapshotCall::new().file("/spec.rs").spec("t").value(later(json!({"id": 1}))))?;
    assert!(ev.is_pending());
    // nothing decided before the value arrives
    assert_eq!(eng.counters().current("t"), 0);

    let stored = ev.resolve().await?;
    assert_eq!(stored, json!({"id": 1}));
    assert_eq!(eng.counters().current("t"), 1);

    // Same outcome as the synchronous path against the stored baseline.
    eng.reset_all();
    let sync = eng.check(SnapshotCall::new().file("/spec.rs").spec("t").value(json!({"id": 1})))?;
    assert_eq!(sync, stored);
    Ok(())
}

#[tokio::test]
async fn pending_mismatch_fails_on_resolve() -> Result<()> {
    let eng = engine();
    eng.check(SnapshotCall::new().file("/spec.rs").exact("k").value(json!(1)))?;

    let err = eng
        .check_async(SnapshotCall::new().file("/spec.rs").exact("k").value(later(json!(2))))
        .await
        .unwrap_err();
    assert!(matches!(SnapError::find(&err), Some(SnapError::Mismatch { .. })));
    Ok(())
}

#[tokio::test]
async fn invalid_call_fails_before_awaiting() -> Result<()> {
    let eng = engine();

    // Missing spec and exact: rejected synchronously, the future is never polled.
    let polled = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let flag = polled.clone();
    let input = SnapInput::pending(async move {
        flag.store(true, std::sync::atomic::Ordering::SeqCst);
        Ok::<_, anyhow::Error>(SnapValue::text("x"))
    });

    let err = eng.evaluate(SnapshotCall::new().file("/spec.rs").value(input)).unwrap_err();
    assert!(matches!(SnapError::find(&err), Some(SnapError::InvalidCall(_))));
    tokio::task::yield_now().await;
    assert!(!polled.load(std::sync::atomic::Ordering::SeqCst));
    Ok(())
}

#[tokio::test]
async fn rejected_value_propagates_without_counting() -> Result<()> {
    let eng = engine();

    let input = SnapInput::pending(async { Err::<SnapValue, _>(anyhow::anyhow!("producer failed")) });
    let err = eng
        .check_async(SnapshotCall::new().file("/spec.rs").spec("t").value(input))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "producer failed");
    assert_eq!(eng.counters().current("t"), 0);
    assert!(eng.counters().used_snapshots().is_empty());
    Ok(())
}

#[tokio::test]
async fn sync_check_refuses_pending_values() -> Result<()> {
    let eng = engine();
    let err = eng
        .check(SnapshotCall::new().file("/spec.rs").spec("t").value(later(json!(1))))
        .unwrap_err();
    assert!(matches!(SnapError::find(&err), Some(SnapError::InvalidCall(_))));
    Ok(())
}

#[tokio::test]
async fn immediate_value_through_async_api() -> Result<()> {
    let eng = engine();
    let ev = eng.evaluate(SnapshotCall::new().file("/spec.rs").spec("t").value("now"))?;
    assert!(!ev.is_pending());
    assert_eq!(ev.resolve().await?, json!("now"));
    assert_eq!(eng.check_async(SnapshotCall::new().file("/spec.rs").spec("u").value("now")).await?, json!("now"));
    Ok(())
}
