//! Storage Module
//!
//! The file-store interface the engine runs on.
//!
//! ## Responsibilities
//! - Map collections to directories and documents to files
//! - Replace document contents atomically (temp file + rename)
//! - Delete collections in a single terminal step
//! - Clean up leftovers of interrupted operations on startup
//!
//! ## Directory Layout
//! ```text
//! {data_dir}/
//!   ├── users/                         collection
//!   │     ├── alice                    document (one JSON object)
//!   │     ├── bob
//!   │     └── .bob.<uuid>.tmp          in-flight write (hidden)
//!   ├── .orders.<uuid>.trash/          collection being deleted (hidden)
//!   └── stray.txt                      ignored (not a directory)
//! ```
//!
//! Backends do no locking of their own; the engine serializes all calls.

mod disk;
mod memory;

pub use disk::DiskStore;
pub use memory::MemoryStore;

use crate::error::Result;

/// Suffix of in-flight document writes
pub const TEMP_SUFFIX: &str = ".tmp";

/// Suffix of collection directories being removed
pub const TRASH_SUFFIX: &str = ".trash";

/// Outcome of a startup sweep
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepResult {
    /// Stale temp files removed
    pub temp_files_removed: usize,

    /// Half-deleted collections removed
    pub trash_dirs_removed: usize,
}

/// Abstract collection/document storage
///
/// Names are passed already validated. Missing entities are reported through
/// the return value (`bool` / `Option`) and turned into errors by the engine.
pub trait FileStore: Send + Sync {
    /// Names of all collections
    fn list_collections(&self) -> Result<Vec<String>>;

    /// Does the collection exist?
    fn collection_exists(&self, collection: &str) -> Result<bool>;

    /// Create an empty collection; false if it already exists
    fn create_collection(&self, collection: &str) -> Result<bool>;

    /// Remove a collection and all its documents; false if absent
    ///
    /// Success means the collection is gone from every listing and its name
    /// can be reused. Reclaiming the contents may lag behind: a backend that
    /// fails to delete them after detaching the collection logs a warning and
    /// leaves them to the next `sweep`, instead of reporting an error for a
    /// removal that already took effect.
    fn remove_collection(&self, collection: &str) -> Result<bool>;

    /// Names of all documents in an existing collection
    fn list_documents(&self, collection: &str) -> Result<Vec<String>>;

    /// Raw bytes of a document, `None` if absent
    fn read_document(&self, collection: &str, name: &str) -> Result<Option<Vec<u8>>>;

    /// Atomically replace (or create) a document
    fn replace_document(&self, collection: &str, name: &str, bytes: &[u8]) -> Result<()>;

    /// Remove a document; false if absent
    fn remove_document(&self, collection: &str, name: &str) -> Result<bool>;

    /// Remove leftovers of interrupted operations
    ///
    /// Only engine-owned entries are touched: hidden directories other than
    /// trashed collections are left alone.
    fn sweep(&self) -> Result<SweepResult> {
        Ok(SweepResult::default())
    }
}
