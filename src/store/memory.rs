//! In-memory record store for hosts without a file system (and for tests).
//!
//! Keeps rendered file contents keyed by the same path the FileStore would
//! use, so text wrapping, sorting and empty-text rejection behave identically.

use anyhow::Result;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use super::{format, relative_display, resolve_snapshot_path, LoadOptions, Records, RecordStore, SaveOptions};

#[derive(Debug)]
pub struct MemoryStore {
    root: PathBuf,
    files: Mutex<BTreeMap<PathBuf, String>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new("/")
    }
}

impl MemoryStore {
    /// Store with a virtual root used for path resolution.
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self {
            root: root.into(),
            files: Mutex::new(BTreeMap::new()),
        }
    }

    fn files(&self) -> MutexGuard<'_, BTreeMap<PathBuf, String>> {
        self.files.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Rendered content of the snapshot file for `file`, if any.
    pub fn contents(&self, file: &Path, ext: &str, use_relative_path: bool) -> Option<String> {
        let path = resolve_snapshot_path(&self.root, file, ext, use_relative_path);
        self.files().get(&path).cloned()
    }

    /// Seed raw content (e.g. a file prepared by hand).
    pub fn insert_raw(&self, file: &Path, ext: &str, use_relative_path: bool, content: &str) {
        let path = resolve_snapshot_path(&self.root, file, ext, use_relative_path);
        self.files().insert(path, content.to_string());
    }

    /// Resolved paths of all stored snapshot files.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files().keys().cloned().collect()
    }
}

impl RecordStore for MemoryStore {
    fn load_records(&self, file: &Path, ext: &str, opts: LoadOptions) -> Result<Option<Records>> {
        match self.contents(file, ext, opts.use_relative_path) {
            None => Ok(None),
            Some(src) => Ok(Some(format::parse(&src)?)),
        }
    }

    fn save_records(
        &self,
        file: &Path,
        records: &Records,
        ext: &str,
        opts: SaveOptions,
    ) -> Result<()> {
        let data = format::render(records, opts.sort_snapshots, &self.path_relative_to_cwd(file))?;
        let path = resolve_snapshot_path(&self.root, file, ext, opts.use_relative_path);
        self.files().insert(path, data);
        Ok(())
    }

    fn snapshot_location(&self, file: &Path, ext: &str, use_relative_path: bool) -> PathBuf {
        resolve_snapshot_path(&self.root, file, ext, use_relative_path)
    }

    fn path_relative_to_cwd(&self, file: &Path) -> String {
        relative_display(&self.root, file)
    }
}
