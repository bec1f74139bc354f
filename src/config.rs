//! Centralized options for snapshot evaluation.
//!
//! Goals:
//! - Single place to collect per-call options instead of scattering env lookups.
//! - SnapConfig::from_env() detects CI and reads SNAPSHOT_* overrides.
//! - SnapConfig::builder() returns a SnapConfigBuilder for explicit setups (tests, embedders).
//!
//! Defaults:
//! - ci = false (from_env(): CI detection result)
//! - sort_snapshots = true (keys are sorted before the file is written)
//! - use_relative_path, show, dry_run, update = false

use std::fmt;

use crate::consts::{
    ENV_CI_GENERIC, ENV_CI_VENDORS, ENV_DRY_RUN, ENV_SHOW, ENV_SORT, ENV_UPDATE,
};

/// Options recognized by the engine for one evaluation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SnapConfig {
    /// Forbid writing new baselines.
    /// Env: CI detection (see `is_ci`).
    pub ci: bool,

    /// Sort keys lexicographically before persisting.
    /// Env: SNAPSHOT_SORT (default true; "0|false|off|no" => false)
    pub sort_snapshots: bool,

    /// Resolve the backing file relative to the store root instead of by base name.
    pub use_relative_path: bool,

    /// Print the value being saved.
    /// Env: SNAPSHOT_SHOW
    pub show: bool,

    /// Compute and print, but never persist.
    /// Env: SNAPSHOT_DRY_RUN
    pub dry_run: bool,

    /// Ignore stored baselines and record the current value again.
    /// Env: SNAPSHOT_UPDATE
    pub update: bool,
}

impl Default for SnapConfig {
    fn default() -> Self {
        Self {
            ci: false,
            sort_snapshots: true,
            use_relative_path: false,
            show: false,
            dry_run: false,
            update: false,
        }
    }
}

fn env_flag(name: &str) -> Option<bool> {
    let v = std::env::var(name).ok()?;
    let s = v.trim().to_ascii_lowercase();
    Some(s == "1" || s == "true" || s == "on" || s == "yes")
}

/// Detect a continuous-integration environment from process env.
///
/// Generic markers (`CI`, `CONTINUOUS_INTEGRATION`, ...) count unless set to
/// `false`/`0`/empty; vendor markers count whenever present.
pub fn is_ci() -> bool {
    for name in ENV_CI_GENERIC {
        if let Ok(v) = std::env::var(name) {
            let s = v.trim().to_ascii_lowercase();
            if !(s.is_empty() || s == "false" || s == "0") {
                return true;
            }
        }
    }
    ENV_CI_VENDORS
        .iter()
        .any(|name| std::env::var_os(name).is_some())
}

impl SnapConfig {
    /// Load options from the environment (CI detection + SNAPSHOT_* overrides).
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        cfg.ci = is_ci();

        if let Some(on) = env_flag(ENV_UPDATE) {
            cfg.update = on;
        }
        if let Some(on) = env_flag(ENV_SHOW) {
            cfg.show = on;
        }
        if let Some(on) = env_flag(ENV_DRY_RUN) {
            cfg.dry_run = on;
        }
        if std::env::var_os(ENV_SORT).is_some() {
            cfg.sort_snapshots = env_flag(ENV_SORT).unwrap_or(true);
        }

        cfg
    }

    pub fn builder() -> SnapConfigBuilder {
        SnapConfigBuilder::new()
    }

    // Fluent setters (builder-style) to override specific fields.

    pub fn with_ci(mut self, on: bool) -> Self {
        self.ci = on;
        self
    }

    pub fn with_sort_snapshots(mut self, on: bool) -> Self {
        self.sort_snapshots = on;
        self
    }

    pub fn with_use_relative_path(mut self, on: bool) -> Self {
        self.use_relative_path = on;
        self
    }

    pub fn with_show(mut self, on: bool) -> Self {
        self.show = on;
        self
    }

    pub fn with_dry_run(mut self, on: bool) -> Self {
        self.dry_run = on;
        self
    }

    pub fn with_update(mut self, on: bool) -> Self {
        self.update = on;
        self
    }
}

impl fmt::Display for SnapConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SnapConfig {{ \
             ci: {}, \
             sort_snapshots: {}, \
             use_relative_path: {}, \
             show: {}, \
             dry_run: {}, \
             update: {} \
             }}",
            self.ci,
            self.sort_snapshots,
            self.use_relative_path,
            self.show,
            self.dry_run,
            self.update,
        )
    }
}

/// Lightweight builder that produces a SnapConfig.
/// `new()` starts from the environment, `from_default()` ignores it.
#[derive(Clone, Debug)]
pub struct SnapConfigBuilder {
    cfg: SnapConfig,
}

impl Default for SnapConfigBuilder {
    fn default() -> Self {
        Self {
            cfg: SnapConfig::from_env(),
        }
    }
}

impl SnapConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a clean default (without reading env).
    pub fn from_default() -> Self {
        Self {
            cfg: SnapConfig::default(),
        }
    }

    pub fn ci(mut self, on: bool) -> Self {
        self.cfg.ci = on;
        self
    }

    pub fn sort_snapshots(mut self, on: bool) -> Self {
        self.cfg.sort_snapshots = on;
        self
    }

    pub fn use_relative_path(mut self, on: bool) -> Self {
        self.cfg.use_relative_path = on;
        self
    }

    pub fn show(mut self, on: bool) -> Self {
        self.cfg.show = on;
        self
    }

    pub fn dry_run(mut self, on: bool) -> Self {
        self.cfg.dry_run = on;
        self
    }

    pub fn update(mut self, on: bool) -> Self {
        self.cfg.update = on;
        self
    }

    /// Finish the builder and obtain the configuration.
    pub fn build(self) -> SnapConfig {
        self.cfg
    }
}
