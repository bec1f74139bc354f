//! File-system record store.
//!
//! Layout: `<root>/__snapshots__/<name><ext>` (see `resolve_snapshot_path`).
//! Writes are atomic via tmp + rename; a failed write removes its tmp file.
//! No cross-process locking.

use anyhow::{Context, Result};
use log::debug;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::{format, relative_display, resolve_snapshot_path, LoadOptions, Records, RecordStore, SaveOptions};
use crate::consts::TMP_SUFFIX;

#[derive(Clone, Debug)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Store rooted at `root` (snapshot folder and relative paths are resolved against it).
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    /// Store rooted at the current working directory.
    pub fn from_cwd() -> Result<Self> {
        let cwd = std::env::current_dir().context("read current directory")?;
        Ok(Self::new(cwd))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Snapshot file backing `file` (for tests/diagnostics).
    pub fn snapshot_path(&self, file: &Path, ext: &str, use_relative_path: bool) -> PathBuf {
        resolve_snapshot_path(&self.root, file, ext, use_relative_path)
    }
}

fn write_tmp(tmp: &Path, data: &[u8]) -> Result<()> {
    let mut f = OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(tmp)
        .with_context(|| format!("open {}", tmp.display()))?;
    f.write_all(data)
        .with_context(|| format!("write {}", tmp.display()))?;
    let _ = f.sync_all();
    Ok(())
}

impl RecordStore for FileStore {
    fn load_records(&self, file: &Path, ext: &str, opts: LoadOptions) -> Result<Option<Records>> {
        let path = self.snapshot_path(file, ext, opts.use_relative_path);
        if !path.exists() {
            debug!("load_records: no snapshot file at {}", path.display());
            return Ok(None);
        }
        let src = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
        let records = format::parse(&src).with_context(|| format!("parse {}", path.display()))?;
        debug!(
            "load_records: {} snapshot(s) from {}",
            records.len(),
            path.display()
        );
        Ok(Some(records))
    }

    fn save_records(
        &self,
        file: &Path,
        records: &Records,
        ext: &str,
        opts: SaveOptions,
    ) -> Result<()> {
        let path = self.snapshot_path(file, ext, opts.use_relative_path);
        let data = format::render(records, opts.sort_snapshots, &self.path_relative_to_cwd(file))?;

        let dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.root.clone());
        fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;

        let mut tmp = path.clone().into_os_string();
        tmp.push(TMP_SUFFIX);
        let tmp = PathBuf::from(tmp);

        let written = write_tmp(&tmp, data.as_bytes()).and_then(|()| {
            fs::rename(&tmp, &path)
                .with_context(|| format!("rename {} -> {}", tmp.display(), path.display()))
        });
        if let Err(e) = written {
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }
        debug!("save_records: {} snapshot(s) -> {}", records.len(), path.display());
        Ok(())
    }

    fn snapshot_location(&self, file: &Path, ext: &str, use_relative_path: bool) -> PathBuf {
        self.snapshot_path(file, ext, use_relative_path)
    }

    fn path_relative_to_cwd(&self, file: &Path) -> String {
        relative_display(&self.root, file)
    }
}
