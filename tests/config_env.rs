use std::sync::{Arc, Mutex, OnceLock};

use anyhow::Result;
use serde_json::json;

use snapcore::{is_ci, MemoryStore, SnapConfig, SnapConfigBuilder, SnapError, SnapshotCall, SnapshotEngine};

// Tests mutate process env; run them one at a time.
static TEST_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

const CI_VARS: &[&str] = &[
    "CI",
    "CONTINUOUS_INTEGRATION",
    "BUILD_NUMBER",
    "RUN_ID",
    "GITHUB_ACTIONS",
    "GITLAB_CI",
    "TRAVIS",
    "CIRCLECI",
    "JENKINS_URL",
    "BUILDKITE",
    "TEAMCITY_VERSION",
    "TF_BUILD",
];

const SNAPSHOT_VARS: &[&str] = &[
    "SNAPSHOT_UPDATE",
    "SNAPSHOT_SHOW",
    "SNAPSHOT_DRY_RUN",
    "SNAPSHOT_SORT",
];

fn clean_env() {
    for v in CI_VARS.iter().chain(SNAPSHOT_VARS) {
        std::env::remove_var(v);
    }
}

#[test]
fn ci_detection_from_generic_and_vendor_markers() {
    let _g = TEST_LOCK.get_or_init(|| Mutex::new(())).lock().unwrap();
    let _ = env_logger::builder().is_test(true).try_init();
    clean_env();

    assert!(!is_ci());

    std::env::set_var("CI", "true");
    assert!(is_ci());

    std::env::set_var("CI", "false");
    assert!(!is_ci());

    std::env::set_var("CI", "0");
    assert!(!is_ci());

    std::env::set_var("CI", "");
    assert!(!is_ci());

    std::env::remove_var("CI");
    std::env::set_var("GITHUB_ACTIONS", "");
    assert!(is_ci(), "vendor markers count when present");

    clean_env();
}

#[test]
fn from_env_reads_snapshot_overrides() {
    let _g = TEST_LOCK.get_or_init(|| Mutex::new(())).lock().unwrap();
    clean_env();

    let cfg = SnapConfig::from_env();
    assert_eq!(cfg, SnapConfig::default());

    std::env::set_var("SNAPSHOT_UPDATE", "1");
    std::env::set_var("SNAPSHOT_SHOW", "yes");
    std::env::set_var("SNAPSHOT_DRY_RUN", "off");
    std::env::set_var("SNAPSHOT_SORT", "false");
    std::env::set_var("BUILD_NUMBER", "42");

    let cfg = SnapConfig::from_env();
    assert!(cfg.update);
    assert!(cfg.show);
    assert!(!cfg.dry_run);
    assert!(!cfg.sort_snapshots);
    assert!(cfg.ci);

    // Builder: new() starts from env, from_default() does not.
    assert!(SnapConfigBuilder::new().build().update);
    assert!(!SnapConfigBuilder::from_default().build().update);
    assert!(!SnapConfig::builder().update(false).build().update);

    clean_env();
}

#[test]
fn engine_new_picks_up_ci_from_env() -> Result<()> {
    let _g = TEST_LOCK.get_or_init(|| Mutex::new(())).lock().unwrap();
    clean_env();
    std::env::set_var("TRAVIS", "true");

    let eng = SnapshotEngine::new(Arc::new(MemoryStore::default()));
    assert!(eng.config().ci);
    let err = eng
        .check(SnapshotCall::new().file("/spec.rs").spec("t").value(json!(1)))
        .unwrap_err();
    assert!(matches!(SnapError::find(&err), Some(SnapError::CiWriteForbidden { .. })));

    clean_env();
    Ok(())
}
