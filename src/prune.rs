//! Pruning of stale snapshot entries.
//!
//! The run orchestrator collects every snapshot produced during a full run
//! (see `CounterRegistry::used_snapshots`) and hands the list over at the end.
//! Entries are grouped by the snapshot file they resolve to, so several source
//! files sharing one snapshot file are pruned once against the union of their
//! keys. Each snapshot file is pruned independently:
//! - missing file: skipped;
//! - nothing to remove: file left untouched;
//! - otherwise the reduced mapping is saved (unless `dry_run`).

use anyhow::Result;
use log::{debug, info};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use crate::config::SnapConfig;
use crate::consts::DEFAULT_EXTENSION;
use crate::error::SnapError;
use crate::metrics;
use crate::store::{LoadOptions, RecordStore, Records, SaveOptions};

/// One snapshot key observed during a run, with the options it was resolved with.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct UsedSnapshot {
    pub file: PathBuf,
    pub key: String,
    pub ext: String,
    pub use_relative_path: bool,
}

impl UsedSnapshot {
    /// Entry with the default extension and base-name resolution.
    pub fn new<P: Into<PathBuf>, S: Into<String>>(file: P, key: S) -> Self {
        Self {
            file: file.into(),
            key: key.into(),
            ext: DEFAULT_EXTENSION.to_string(),
            use_relative_path: false,
        }
    }

    pub fn with_ext<S: Into<String>>(mut self, ext: S) -> Self {
        self.ext = ext.into();
        self
    }

    pub fn with_use_relative_path(mut self, on: bool) -> Self {
        self.use_relative_path = on;
        self
    }
}

/// Entry removed from a snapshot file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrunedSnapshot {
    /// Snapshot file location as reported by the store.
    pub location: PathBuf,
    pub key: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PruneReport {
    pub files_scanned: usize,
    pub files_rewritten: usize,
    /// Entries removed (or that would be removed in dry-run).
    pub removed: Vec<PrunedSnapshot>,
}

impl PruneReport {
    fn merge(&mut self, other: PruneReport) {
        self.files_scanned += other.files_scanned;
        self.files_rewritten += other.files_rewritten;
        self.removed.extend(other.removed);
    }

    /// Removed keys in report order.
    pub fn removed_keys(&self) -> Vec<&str> {
        self.removed.iter().map(|p| p.key.as_str()).collect()
    }
}

fn check_ext(ext: &str) -> Result<()> {
    if !ext.starts_with('.') {
        return Err(SnapError::invalid(format!("extension should start with ., got '{}'", ext)).into());
    }
    Ok(())
}

fn prune_location(
    store: &dyn RecordStore,
    file: &Path,
    used_keys: &HashSet<String>,
    ext: &str,
    use_relative_path: bool,
    cfg: &SnapConfig,
) -> Result<PruneReport> {
    let mut report = PruneReport::default();
    let location = store.snapshot_location(file, ext, use_relative_path);

    let records = match store.load_records(file, ext, LoadOptions { use_relative_path })? {
        Some(r) => r,
        None => {
            debug!("prune: no snapshot file at {}", location.display());
            return Ok(report);
        }
    };
    report.files_scanned = 1;

    let (kept, stale): (Vec<_>, Vec<_>) = records
        .into_iter()
        .partition(|(key, _)| used_keys.contains(key));

    if stale.is_empty() {
        debug!("prune: {} is up to date", location.display());
        return Ok(report);
    }

    for (key, _) in &stale {
        report.removed.push(PrunedSnapshot {
            location: location.clone(),
            key: key.clone(),
        });
    }
    info!("prune: {} stale snapshot(s) in {}", stale.len(), location.display());

    if cfg.dry_run {
        for p in &report.removed {
            println!("would prune snapshot \"{}\"", p.key);
        }
        return Ok(report);
    }

    let pruned: Records = kept.into_iter().collect();
    let opts = SaveOptions {
        sort_snapshots: cfg.sort_snapshots,
        use_relative_path,
    };
    store.save_records(file, &pruned, ext, opts)?;
    report.files_rewritten = 1;
    metrics::record_keys_pruned(stale.len());
    Ok(report)
}

/// Remove from the snapshot file of `file` every key not in `used_keys`.
pub fn prune_file(
    store: &dyn RecordStore,
    file: &Path,
    used_keys: &HashSet<String>,
    ext: &str,
    cfg: &SnapConfig,
) -> Result<PruneReport> {
    check_ext(ext)?;
    prune_location(store, file, used_keys, ext, cfg.use_relative_path, cfg)
}

struct Group<'a> {
    file: &'a Path,
    ext: &'a str,
    use_relative_path: bool,
    keys: HashSet<String>,
}

/// Group `used` by the snapshot file each entry resolves to and prune each file once.
pub fn prune_snapshots(
    store: &dyn RecordStore,
    used: &[UsedSnapshot],
    cfg: &SnapConfig,
) -> Result<PruneReport> {
    let mut groups: BTreeMap<PathBuf, Group<'_>> = BTreeMap::new();
    for u in used {
        check_ext(&u.ext)?;
        let location = store.snapshot_location(&u.file, &u.ext, u.use_relative_path);
        groups
            .entry(location)
            .or_insert_with(|| Group {
                file: &u.file,
                ext: &u.ext,
                use_relative_path: u.use_relative_path,
                keys: HashSet::new(),
            })
            .keys
            .insert(u.key.clone());
    }

    let mut report = PruneReport::default();
    for g in groups.values() {
        report.merge(prune_location(store, g.file, &g.keys, g.ext, g.use_relative_path, cfg)?);
    }
    Ok(report)
}
