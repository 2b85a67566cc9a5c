//! Engine Module
//!
//! The storage engine that maps collection/document operations onto a
//! `FileStore`.
//!
//! ## Responsibilities
//! - Validate names before they reach the filesystem
//! - Serialize every operation behind one lock
//! - Create-or-merge document updates with stable identifiers
//! - Unindexed equality filtering over a collection
//! - Clean up interrupted writes/deletes on startup

use std::path::Path;

use parking_lot::Mutex;
use serde_json::{json, Value};

use crate::config::Config;
use crate::document::{self, validate_name, Document, Filter};
use crate::error::{AtlasError, Result};
use crate::protocol::Command;
use crate::storage::{DiskStore, FileStore};

/// The main storage engine
///
/// ## Concurrency Model: Single Global Lock
///
/// Every call, read or write, on any collection, takes `lock` for its whole
/// duration. At most one engine call runs at a time in the process.
///
/// - Merge updates are read-modify-write on a plain file; without the lock
///   two writers on the same document lose updates.
/// - Long calls (a filter over a large collection) block everything else.
///   There is no cancellation; a caller that gives up must still let the
///   call finish.
/// - The lock says nothing about other processes touching `data_dir`.
///
/// Document writes still go through `FileStore::replace_document`, which is
/// atomic on its own, so readers never depend on the lock to avoid torn files.
///
/// ## Filtering
/// There is no index. `filter_documents` decodes every document in the
/// collection, O(collection size) per call.
pub struct Engine<S: FileStore = DiskStore> {
    /// Engine configuration
    config: Config,

    /// Backing store (directories and files)
    store: S,

    /// Serializes all operations
    lock: Mutex<()>,
}

impl Engine<DiskStore> {
    /// Open or create an engine with the given config
    ///
    /// On startup:
    /// 1. Create the data directory if needed
    /// 2. Sweep temp files and trashed collections left by a crash
    /// 3. Ready to serve requests
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;

        // Step 1: Open the disk store (creates data_dir)
        let store = DiskStore::open(&config.data_dir, config.sync_writes)?;

        // Step 2: Recover from interrupted operations
        let sweep = store.sweep()?;
        if sweep.temp_files_removed > 0 || sweep.trash_dirs_removed > 0 {
            tracing::warn!(
                "Startup sweep: removed {} stale temp files, {} half-deleted collections",
                sweep.temp_files_removed,
                sweep.trash_dirs_removed
            );
        }

        Ok(Self::with_store(config, store))
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data directory
    pub fn open_path(path: &Path) -> Result<Self> {
        Self::open(Config::builder().data_dir(path).build())
    }

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        self.store.base_dir()
    }
}

impl<S: FileStore> Engine<S> {
    /// Build an engine over any store (used with `MemoryStore` in tests)
    pub fn with_store(config: Config, store: S) -> Self {
        Self {
            config,
            store,
            lock: Mutex::new(()),
        }
    }

    /// Execute a command
    ///
    /// Routes commands to the matching operation and returns the JSON result
    pub fn execute(&self, command: Command) -> Result<Value> {
        match command {
            Command::Ping => Ok(json!("PONG")),
            Command::ListCollections => Ok(json!(self.list_collections()?)),
            Command::CreateCollection { collection } => {
                self.create_collection(&collection)?;
                Ok(json!({ "message": format!("collection {} created", collection) }))
            }
            Command::DropCollection { collection } => {
                self.delete_collection(&collection)?;
                Ok(json!({ "message": format!("collection {} deleted", collection) }))
            }
            Command::ListDocuments { collection } => {
                Ok(json!(self.list_documents(&collection)?))
            }
            Command::Get { collection, name } => {
                Ok(Value::Object(self.get_document(&collection, &name)?))
            }
            Command::Put {
                collection,
                name,
                payload,
            } => Ok(Value::Object(
                self.create_or_update_document(&collection, &name, payload)?,
            )),
            Command::Delete { collection, name } => {
                self.delete_document(&collection, &name)?;
                Ok(json!({ "message": format!("document {}/{} deleted", collection, name) }))
            }
            Command::Filter { collection, filter } => {
                let documents = self.filter_documents(&collection, &filter)?;
                Ok(Value::Array(documents.into_iter().map(Value::Object).collect()))
            }
        }
    }

    // =========================================================================
    // Collections
    // =========================================================================

    /// Create an empty collection
    pub fn create_collection(&self, name: &str) -> Result<()> {
        validate_name(name)?;
        let _guard = self.lock.lock();

        if !self.store.create_collection(name)? {
            return Err(AtlasError::AlreadyExists(format!("collection {}", name)));
        }

        tracing::debug!("Created collection {}", name);
        Ok(())
    }

    /// Delete a collection and every document in it
    pub fn delete_collection(&self, name: &str) -> Result<()> {
        validate_name(name)?;
        let _guard = self.lock.lock();

        if !self.store.remove_collection(name)? {
            return Err(not_found_collection(name));
        }

        tracing::debug!("Deleted collection {}", name);
        Ok(())
    }

    /// Names of all collections, in no guaranteed order
    pub fn list_collections(&self) -> Result<Vec<String>> {
        let _guard = self.lock.lock();
        self.store.list_collections()
    }

    // =========================================================================
    // Documents
    // =========================================================================

    /// Create a document or merge the payload into the existing one
    ///
    /// Steps:
    /// 1. Read the existing document (absent = empty object)
    /// 2. Assign a `uuid` if it has none
    /// 3. Shallow merge the payload over it
    /// 4. Atomically replace the file
    ///
    /// Returns the persisted document.
    pub fn create_or_update_document(
        &self,
        collection: &str,
        name: &str,
        payload: Value,
    ) -> Result<Document> {
        validate_name(collection)?;
        validate_name(name)?;
        let payload = document::into_object(payload)?;

        let _guard = self.lock.lock();
        self.require_collection(collection)?;

        // Step 1: Load existing content
        let mut doc = match self.store.read_document(collection, name)? {
            Some(bytes) => document::decode(collection, name, &bytes)?,
            None => Document::new(),
        };

        // Step 2: Identifier is assigned once and kept forever
        if document::ensure_identifier(&mut doc) {
            tracing::debug!("Assigned identifier to {}/{}", collection, name);
        }

        // Step 3: Merge
        document::merge(&mut doc, payload);

        // Step 4: Persist
        let bytes = document::encode(&doc)?;
        self.store.replace_document(collection, name, &bytes)?;

        tracing::debug!("Wrote {}/{} ({} bytes)", collection, name, bytes.len());
        Ok(doc)
    }

    /// Read a document as stored
    pub fn get_document(&self, collection: &str, name: &str) -> Result<Document> {
        validate_name(collection)?;
        validate_name(name)?;
        let _guard = self.lock.lock();

        self.require_collection(collection)?;
        match self.store.read_document(collection, name)? {
            Some(bytes) => document::decode(collection, name, &bytes),
            None => Err(not_found_document(collection, name)),
        }
    }

    /// Delete a document
    pub fn delete_document(&self, collection: &str, name: &str) -> Result<()> {
        validate_name(collection)?;
        validate_name(name)?;
        let _guard = self.lock.lock();

        self.require_collection(collection)?;
        if !self.store.remove_document(collection, name)? {
            return Err(not_found_document(collection, name));
        }

        tracing::debug!("Deleted document {}/{}", collection, name);
        Ok(())
    }

    /// Names of the documents in a collection, in no guaranteed order
    pub fn list_documents(&self, collection: &str) -> Result<Vec<String>> {
        validate_name(collection)?;
        let _guard = self.lock.lock();

        self.require_collection(collection)?;
        self.store.list_documents(collection)
    }

    /// Full documents matching the filter
    ///
    /// Linear scan: every document is decoded. One corrupt document fails the
    /// whole call with `Corrupt`; no partial results are returned.
    pub fn filter_documents(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>> {
        validate_name(collection)?;
        let _guard = self.lock.lock();

        self.require_collection(collection)?;

        let mut names = self.store.list_documents(collection)?;
        names.sort();

        let mut matches = Vec::new();
        for name in &names {
            // Removed between listing and reading only by an outside process
            let Some(bytes) = self.store.read_document(collection, name)? else {
                continue;
            };
            let doc = document::decode(collection, name, &bytes)?;
            if filter.matches(&doc) {
                matches.push(doc);
            }
        }

        tracing::debug!(
            "Filter on {} scanned {} documents, {} matched",
            collection,
            names.len(),
            matches.len()
        );
        Ok(matches)
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the backing store
    pub fn store(&self) -> &S {
        &self.store
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Called with the lock held
    fn require_collection(&self, collection: &str) -> Result<()> {
        if self.store.collection_exists(collection)? {
            Ok(())
        } else {
            Err(not_found_collection(collection))
        }
    }
}

fn not_found_collection(name: &str) -> AtlasError {
    AtlasError::NotFound(format!("collection {}", name))
}

fn not_found_document(collection: &str, name: &str) -> AtlasError {
    AtlasError::NotFound(format!("document {}/{}", collection, name))
}
