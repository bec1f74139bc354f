//! Snapshot call: builder + synchronous validation.
//!
//! Validation runs before any I/O and before a deferred value is awaited.

use anyhow::Result;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;

use crate::compare::CompareResult;
use crate::config::SnapConfig;
use crate::consts::DEFAULT_EXTENSION;
use crate::error::SnapError;
use crate::hooks::{Hook, Hooks, Mismatch};
use crate::value::{SnapInput, SnapValue};

/// One request to record-or-compare a value.
#[derive(Debug, Default)]
pub struct SnapshotCall {
    value: Option<SnapInput>,
    file: Option<PathBuf>,
    source_file: Option<PathBuf>,
    spec: Option<String>,
    exact: Option<String>,
    hooks: Hooks,
    ext: Option<String>,
    comment: Option<String>,
    config: Option<SnapConfig>,
}

impl SnapshotCall {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value to check (immediate or pending).
    pub fn value<V: Into<SnapInput>>(mut self, value: V) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Backing file identifier.
    pub fn file<P: Into<PathBuf>>(mut self, file: P) -> Self {
        self.file = Some(file.into());
        self
    }

    /// Caller's source location; used when no explicit file is given.
    pub fn source_file<P: Into<PathBuf>>(mut self, file: P) -> Self {
        self.source_file = Some(file.into());
        self
    }

    /// Test identifier; keys become `"<spec> <index>"`.
    pub fn spec<S: Into<String>>(mut self, spec: S) -> Self {
        self.spec = Some(spec.into());
        self
    }

    /// Exact snapshot key; bypasses the per-test counter.
    pub fn exact<S: Into<String>>(mut self, name: S) -> Self {
        self.exact = Some(name.into());
        self
    }

    pub fn transform<F>(mut self, f: F) -> Self
    where
        F: Fn(SnapValue) -> Result<SnapValue> + Send + Sync + 'static,
    {
        self.hooks.transform = Hook::Custom(Arc::new(f));
        self
    }

    pub fn compare<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value, &SnapValue) -> CompareResult + Send + Sync + 'static,
    {
        self.hooks.compare = Hook::Custom(Arc::new(f));
        self
    }

    pub fn raise<F>(mut self, f: F) -> Self
    where
        F: Fn(&Mismatch<'_>) -> Result<()> + Send + Sync + 'static,
    {
        self.hooks.raise = Hook::Custom(Arc::new(f));
        self
    }

    pub fn hooks(mut self, hooks: Hooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// Snapshot file extension; must start with `.`.
    pub fn ext<S: Into<String>>(mut self, ext: S) -> Self {
        self.ext = Some(ext.into());
        self
    }

    pub fn comment<S: Into<String>>(mut self, comment: S) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Per-call options; the engine's config is used otherwise.
    pub fn config(mut self, config: SnapConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Check required fields and split into the input and the resolved call.
    pub(crate) fn validate(self, defaults: &SnapConfig) -> Result<(SnapInput, ResolvedCall)> {
        let input = self.value.ok_or_else(|| SnapError::invalid("Cannot store undefined value"))?;

        let file = self
            .file
            .or(self.source_file)
            .filter(|f| !f.as_os_str().is_empty())
            .ok_or_else(|| SnapError::invalid("missing file"))?;

        if matches!(&self.spec, Some(s) if s.is_empty()) {
            return Err(SnapError::invalid("invalid spec name: empty").into());
        }
        if matches!(&self.exact, Some(s) if s.is_empty()) {
            return Err(SnapError::invalid("invalid exact snapshot name: empty").into());
        }
        if self.spec.is_none() && self.exact.is_none() {
            return Err(SnapError::invalid("missing either spec name or exact snapshot name").into());
        }

        let ext = self.ext.unwrap_or_else(|| DEFAULT_EXTENSION.to_string());
        if !ext.starts_with('.') {
            return Err(SnapError::invalid(format!("extension should start with ., got '{}'", ext)).into());
        }

        if matches!(&self.comment, Some(c) if c.is_empty()) {
            return Err(SnapError::invalid("wrong comment: empty").into());
        }

        let resolved = ResolvedCall {
            file,
            spec: self.spec,
            exact: self.exact,
            hooks: self.hooks,
            ext,
            comment: self.comment,
            config: self.config.unwrap_or_else(|| defaults.clone()),
        };
        Ok((input, resolved))
    }
}

/// Validated call, owned so it can move into a deferred evaluation.
#[derive(Debug, Clone)]
pub(crate) struct ResolvedCall {
    pub file: PathBuf,
    pub spec: Option<String>,
    pub exact: Option<String>,
    pub hooks: Hooks,
    pub ext: String,
    pub comment: Option<String>,
    pub config: SnapConfig,
}

impl ResolvedCall {
    /// Name used in messages: spec name, else the exact key.
    pub fn display_name(&self) -> &str {
        self.spec
            .as_deref()
            .or(self.exact.as_deref())
            .unwrap_or_default()
    }
}
