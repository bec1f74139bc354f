// Base modules
pub mod consts;
pub mod config;
pub mod error;
pub mod metrics;

// Values, comparison, per-call hooks
pub mod value;
pub mod compare;
pub mod hooks;

// Run state and storage
pub mod counters;
pub mod store;  // src/store/{mod,format,file,memory}.rs

// Engine and pruning
pub mod engine; // src/engine/{mod,call,decide}.rs
pub mod prune;

// Re-exports
pub use config::{is_ci, SnapConfig, SnapConfigBuilder};
pub use counters::CounterRegistry;
pub use engine::{form_key, Evaluation, SnapshotCall, SnapshotEngine};
pub use error::SnapError;
pub use hooks::{Hook, Hooks, Mismatch};
pub use prune::{prune_file, prune_snapshots, PruneReport, PrunedSnapshot, UsedSnapshot};
pub use store::{FileStore, LoadOptions, MemoryStore, RecordStore, Records, SaveOptions};
pub use value::{normalize, SnapFn, SnapInput, SnapValue};
