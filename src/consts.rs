//! Shared constants: snapshot file naming, record format tokens, env variables.

// -------- Snapshot files --------
pub const DEFAULT_EXTENSION: &str = ".snapshot.js";
pub const SNAPSHOTS_DIR: &str = "__snapshots__";
pub const TMP_SUFFIX: &str = ".tmp";

// -------- Record format --------
// exports['<key>'] = <payload>
pub const ENTRY_PREFIX: &str = "exports[";
pub const ENTRY_ASSIGN: &str = "] = ";
pub const TEXT_QUOTE: char = '`';

// -------- ENV --------
pub const ENV_UPDATE: &str = "SNAPSHOT_UPDATE";
pub const ENV_SHOW: &str = "SNAPSHOT_SHOW";
pub const ENV_DRY_RUN: &str = "SNAPSHOT_DRY_RUN";
pub const ENV_SORT: &str = "SNAPSHOT_SORT";

// Generic CI markers; any of them set (and not "false"/"0") means CI.
pub const ENV_CI_GENERIC: &[&str] = &["CI", "CONTINUOUS_INTEGRATION", "BUILD_NUMBER", "RUN_ID"];

// Vendor markers (presence is enough).
pub const ENV_CI_VENDORS: &[&str] = &[
    "GITHUB_ACTIONS",
    "GITLAB_CI",
    "TRAVIS",
    "CIRCLECI",
    "JENKINS_URL",
    "BUILDKITE",
    "TEAMCITY_VERSION",
    "TF_BUILD",
];
