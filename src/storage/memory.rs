//! In-memory file store
//!
//! Same contract as `DiskStore` without touching the disk. Used to test the
//! engine's logic in isolation and to inject corrupt content.

use std::collections::BTreeMap;
use std::io::ErrorKind;

use parking_lot::RwLock;

use crate::error::Result;

use super::FileStore;

type Collection = BTreeMap<String, Vec<u8>>;

/// File store kept entirely in memory
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<BTreeMap<String, Collection>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Write raw bytes into a document, bypassing the engine
    ///
    /// Creates the collection if needed.
    pub fn insert_raw(&self, collection: &str, name: &str, bytes: impl Into<Vec<u8>>) {
        self.collections
            .write()
            .entry(collection.to_string())
            .or_default()
            .insert(name.to_string(), bytes.into());
    }

    /// Total number of documents across all collections
    pub fn document_count(&self) -> usize {
        self.collections.read().values().map(|c| c.len()).sum()
    }
}

impl FileStore for MemoryStore {
    fn list_collections(&self) -> Result<Vec<String>> {
        Ok(self.collections.read().keys().cloned().collect())
    }

    fn collection_exists(&self, collection: &str) -> Result<bool> {
        Ok(self.collections.read().contains_key(collection))
    }

    fn create_collection(&self, collection: &str) -> Result<bool> {
        let mut collections = self.collections.write();
        if collections.contains_key(collection) {
            return Ok(false);
        }
        collections.insert(collection.to_string(), Collection::new());
        Ok(true)
    }

    fn remove_collection(&self, collection: &str) -> Result<bool> {
        Ok(self.collections.write().remove(collection).is_some())
    }

    fn list_documents(&self, collection: &str) -> Result<Vec<String>> {
        Ok(self
            .collections
            .read()
            .get(collection)
            .map(|docs| docs.keys().cloned().collect())
            .unwrap_or_default())
    }

    fn read_document(&self, collection: &str, name: &str) -> Result<Option<Vec<u8>>> {
        Ok(self
            .collections
            .read()
            .get(collection)
            .and_then(|docs| docs.get(name).cloned()))
    }

    fn replace_document(&self, collection: &str, name: &str, bytes: &[u8]) -> Result<()> {
        match self.collections.write().get_mut(collection) {
            Some(docs) => {
                docs.insert(name.to_string(), bytes.to_vec());
                Ok(())
            }
            None => Err(std::io::Error::new(
                ErrorKind::NotFound,
                format!("collection {} does not exist", collection),
            )
            .into()),
        }
    }

    fn remove_document(&self, collection: &str, name: &str) -> Result<bool> {
        Ok(self
            .collections
            .write()
            .get_mut(collection)
            .map_or(false, |docs| docs.remove(name).is_some()))
    }
}
