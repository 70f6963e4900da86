//! r2sync-core: Core library for the r2sync CLI
//!
//! This crate provides:
//! - Store identity and settings loading
//! - Local path to object key mapping
//! - Per-file upload reconciliation and directory walking
//! - Object and folder deletion
//! - The ObjectStore trait the S3 adapter implements
//!
//! Nothing here depends on a specific S3 SDK, so the sync logic can be
//! exercised against test doubles.

pub mod config;
pub mod delete;
pub mod digest;
pub mod error;
pub mod ignore;
pub mod path;
pub mod sync;
pub mod traits;
pub mod walk;

#[cfg(test)]
mod testing;

pub use config::{Settings, SettingsManager, StoreIdentity};
pub use delete::{DeleteOutcome, DeleteReport, DeleteSummary, DeleteTarget, Deleter};
pub use error::{Error, Result};
pub use ignore::IgnoreRules;
pub use path::{map_key, ObjectKey};
pub use sync::{Decision, FileReport, LocalFileRecord, Outcome, Reconciler, SkipReason};
pub use traits::{ListOptions, ListResult, ObjectStore, RemoteObjectMeta};
pub use walk::{walk_and_reconcile, SyncSummary};
