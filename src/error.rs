//! Typed snapshot errors.
//!
//! Public operations return `anyhow::Result`; the kinds below travel inside
//! `anyhow::Error` and are recovered with `err.downcast_ref::<SnapError>()`.

/// Snapshot error kinds.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SnapError {
    /// Missing or malformed call field; raised before any I/O.
    #[error("invalid snapshot call: {0}")]
    InvalidCall(String),

    /// No baseline exists and writing one is forbidden (`ci = true`).
    #[error(
        "Cannot store new snapshot value\n\
         in '{file}'\n\
         for snapshot called '{spec}'\n\
         test key '{key}'\n\
         when running on CI (opts.ci = 1)"
    )]
    CiWriteForbidden {
        file: String,
        spec: String,
        key: String,
    },

    /// Stored baseline differs from the current value.
    #[error(
        "snapshot mismatch for '{spec}'\n\
         test key '{key}'\n\
         in '{file}': {message}{diff}"
    )]
    Mismatch {
        file: String,
        spec: String,
        key: String,
        /// `<expected> !== <value>` from the comparator.
        message: String,
        /// Rendered line diff (may be empty).
        diff: String,
    },

    /// Text snapshots must carry content.
    #[error(
        "Cannot store empty string as a snapshot value.\n\
         The value you are trying to store in snapshot '{name}'\n\
         in '{file}'\n\
         is empty. Snapshots only work well if they have actual content to store."
    )]
    EmptyText { name: String, file: String },

    /// Snapshot file could not be parsed.
    #[error("malformed snapshot file at line {line}: {message}")]
    Format { line: usize, message: String },
}

impl SnapError {
    pub fn invalid<S: Into<String>>(msg: S) -> Self {
        SnapError::InvalidCall(msg.into())
    }

    /// Recover a `SnapError` from an `anyhow::Error` chain, if present.
    pub fn find(err: &anyhow::Error) -> Option<&SnapError> {
        err.chain().find_map(|e| e.downcast_ref::<SnapError>())
    }
}
