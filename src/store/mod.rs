//! Snapshot record stores.
//!
//! The engine depends only on [`RecordStore`]; the embedding application picks
//! an implementation at construction time:
//! - file.rs: FileStore, snapshot files under `<root>/__snapshots__/`.
//! - memory.rs: MemoryStore, same format kept in memory (no file system).
//! - format.rs: record (de)serialization rules shared by both.

use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

use anyhow::Result;
use difference::{Changeset, Difference};
use log::debug;
use serde_json::Value;

use crate::config::SnapConfig;
use crate::consts::SNAPSHOTS_DIR;
use crate::error::SnapError;
use crate::hooks::Mismatch;
use crate::value::serialize_pretty;

pub mod format;

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Full contents of one backing file: key -> stored value, in insertion order.
pub type Records = serde_json::Map<String, Value>;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoadOptions {
    pub use_relative_path: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SaveOptions {
    pub sort_snapshots: bool,
    pub use_relative_path: bool,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            sort_snapshots: true,
            use_relative_path: false,
        }
    }
}

impl From<&SnapConfig> for LoadOptions {
    fn from(cfg: &SnapConfig) -> Self {
        Self {
            use_relative_path: cfg.use_relative_path,
        }
    }
}

impl From<&SnapConfig> for SaveOptions {
    fn from(cfg: &SnapConfig) -> Self {
        Self {
            sort_snapshots: cfg.sort_snapshots,
            use_relative_path: cfg.use_relative_path,
        }
    }
}

/// Persistent storage of snapshot record mappings.
pub trait RecordStore: Send + Sync {
    /// Load the mapping for `file`. `None` means no snapshot file yet
    /// (distinct from an existing empty one).
    fn load_records(&self, file: &Path, ext: &str, opts: LoadOptions) -> Result<Option<Records>>;

    /// Replace the mapping for `file`.
    fn save_records(&self, file: &Path, records: &Records, ext: &str, opts: SaveOptions)
        -> Result<()>;

    /// Snapshot file backing `file`. Source files sharing a location share records.
    fn snapshot_location(&self, file: &Path, ext: &str, use_relative_path: bool) -> PathBuf;

    /// `file` relative to the store's working directory, for messages.
    fn path_relative_to_cwd(&self, file: &Path) -> String;

    /// Default raiser: fail with both serialized forms and a line diff.
    fn raise_if_different(&self, mismatch: &Mismatch<'_>) -> Result<()> {
        raise_mismatch(mismatch)
    }
}

/// Build the `SnapError::Mismatch` for a failed comparison.
pub fn raise_mismatch(mismatch: &Mismatch<'_>) -> Result<()> {
    debug!("Test \"{}\" snapshot difference", mismatch.spec);
    let diff = render_diff(&serialize_pretty(mismatch.expected), &mismatch.value.pretty());
    Err(SnapError::Mismatch {
        file: mismatch.file.display().to_string(),
        spec: mismatch.spec.to_string(),
        key: mismatch.key.to_string(),
        message: mismatch.message.to_string(),
        diff,
    }
    .into())
}

/// Line diff, `-` for expected-only lines and `+` for value-only lines.
pub fn render_diff(expected: &str, value: &str) -> String {
    let changeset = Changeset::new(expected, value, "\n");
    if changeset.distance == 0 {
        return String::new();
    }
    let mut out = String::from("\n");
    for d in &changeset.diffs {
        let (prefix, chunk) = match d {
            Difference::Same(x) => ("  ", x),
            Difference::Rem(x) => ("- ", x),
            Difference::Add(x) => ("+ ", x),
        };
        for line in chunk.split('\n') {
            out.push_str(prefix);
            out.push_str(line);
            out.push('\n');
        }
    }
    out
}

fn with_extension(path: PathBuf, ext: &str) -> PathBuf {
    let mut s: OsString = path.into_os_string();
    s.push(ext);
    PathBuf::from(s)
}

/// Path of the snapshot file for `file`.
///
/// - default: `<root>/__snapshots__/<base name><ext>`
/// - `use_relative_path`: `<root>/__snapshots__/<path relative to root><ext>`;
///   files outside `root` fall back to their base name.
pub fn resolve_snapshot_path(root: &Path, file: &Path, ext: &str, use_relative_path: bool) -> PathBuf {
    let dir = root.join(SNAPSHOTS_DIR);
    let base = || {
        file.file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("snapshots"))
    };
    let name = if use_relative_path {
        let rel = if file.is_absolute() {
            file.strip_prefix(root).map(Path::to_path_buf).ok()
        } else {
            Some(file.to_path_buf())
        };
        match rel {
            // No escaping the snapshot folder through `..`.
            Some(r) if !r.components().any(|c| matches!(c, Component::ParentDir)) => r,
            _ => base(),
        }
    } else {
        base()
    };
    with_extension(dir.join(name), ext)
}

/// `file` relative to `root` when it lives under it, otherwise as given.
pub fn relative_display(root: &Path, file: &Path) -> String {
    file.strip_prefix(root)
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| file.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_path_by_base_name() {
        let p = resolve_snapshot_path(
            Path::new("/work"),
            Path::new("/work/tests/spec.rs"),
            ".snapshot.js",
            false,
        );
        assert_eq!(p, PathBuf::from("/work/__snapshots__/spec.rs.snapshot.js"));
    }

    #[test]
    fn snapshot_path_relative_keeps_dirs() {
        let p = resolve_snapshot_path(
            Path::new("/work"),
            Path::new("/work/tests/unit/spec.rs"),
            ".snap",
            true,
        );
        assert_eq!(p, PathBuf::from("/work/__snapshots__/tests/unit/spec.rs.snap"));

        let outside = resolve_snapshot_path(Path::new("/work"), Path::new("/elsewhere/x.rs"), ".snap", true);
        assert_eq!(outside, PathBuf::from("/work/__snapshots__/x.rs.snap"));
    }

    #[test]
    fn diff_marks_changed_lines() {
        let d = render_diff("{\n  \"a\": 1\n}", "{\n  \"a\": 2\n}");
        assert!(d.contains("-   \"a\": 1"), "{d}");
        assert!(d.contains("+   \"a\": 2"), "{d}");
        assert!(render_diff("same", "same").is_empty());
    }
}
