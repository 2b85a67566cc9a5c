//! Disk-backed file store
//!
//! Collections are directories under the base path, documents are files.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::error::Result;

use super::{FileStore, SweepResult, TEMP_SUFFIX, TRASH_SUFFIX};

/// File store over a real directory tree
pub struct DiskStore {
    /// Base directory holding one subdirectory per collection
    base_dir: PathBuf,

    /// fsync temp files before renaming them into place
    sync_writes: bool,
}

impl DiskStore {
    /// Open a store rooted at `base_dir`, creating the directory if needed
    pub fn open(base_dir: &Path, sync_writes: bool) -> Result<Self> {
        fs::create_dir_all(base_dir)?;

        Ok(Self {
            base_dir: base_dir.to_path_buf(),
            sync_writes,
        })
    }

    /// Get the base directory path
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn collection_path(&self, collection: &str) -> PathBuf {
        self.base_dir.join(collection)
    }

    fn document_path(&self, collection: &str, name: &str) -> PathBuf {
        self.base_dir.join(collection).join(name)
    }

    /// Hidden sibling path: `.{name}.{uuid}{suffix}`
    fn hidden_sibling(dir: &Path, name: &str, suffix: &str) -> PathBuf {
        dir.join(format!(".{}.{}{}", name, Uuid::new_v4().simple(), suffix))
    }

    /// Visible entry names in `dir` for which `keep` holds
    fn visible_entries(dir: &Path, keep: impl Fn(&fs::FileType) -> bool) -> Result<Vec<String>> {
        let mut names = Vec::new();

        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(_) => continue, // not representable as a name
            };
            if name.starts_with('.') {
                continue;
            }
            if keep(&entry.file_type()?) {
                names.push(name);
            }
        }

        Ok(names)
    }

    /// Remove hidden temp files in one collection directory
    fn sweep_collection(dir: &Path) -> Result<usize> {
        let mut removed = 0;

        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') && name.ends_with(TEMP_SUFFIX) && entry.file_type()?.is_file() {
                fs::remove_file(entry.path())?;
                removed += 1;
            }
        }

        Ok(removed)
    }
}

impl FileStore for DiskStore {
    fn list_collections(&self) -> Result<Vec<String>> {
        Self::visible_entries(&self.base_dir, |ty| ty.is_dir())
    }

    fn collection_exists(&self, collection: &str) -> Result<bool> {
        match fs::metadata(self.collection_path(collection)) {
            Ok(meta) => Ok(meta.is_dir()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn create_collection(&self, collection: &str) -> Result<bool> {
        match fs::create_dir(self.collection_path(collection)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn remove_collection(&self, collection: &str) -> Result<bool> {
        if !self.collection_exists(collection)? {
            return Ok(false);
        }

        // Step 1: Move out of the way (single rename, the name is free afterwards)
        let trash = Self::hidden_sibling(&self.base_dir, collection, TRASH_SUFFIX);
        fs::rename(self.collection_path(collection), &trash)?;

        // Step 2: Delete contents; leftovers are swept on next open
        if let Err(e) = fs::remove_dir_all(&trash) {
            tracing::warn!("Failed to remove trashed collection {}: {}", collection, e);
        }

        Ok(true)
    }

    fn list_documents(&self, collection: &str) -> Result<Vec<String>> {
        Self::visible_entries(&self.collection_path(collection), |ty| ty.is_file())
    }

    fn read_document(&self, collection: &str, name: &str) -> Result<Option<Vec<u8>>> {
        let path = self.document_path(collection, name);
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) if path.is_dir() => {
                tracing::debug!("{}/{} is a directory: {}", collection, name, e);
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn replace_document(&self, collection: &str, name: &str, bytes: &[u8]) -> Result<()> {
        let dir = self.collection_path(collection);
        let tmp_path = Self::hidden_sibling(&dir, name, TEMP_SUFFIX);

        // Step 1: Write the full content to a hidden temp file
        let written = (|| -> std::io::Result<()> {
            let mut file = File::create(&tmp_path)?;
            file.write_all(bytes)?;
            if self.sync_writes {
                file.sync_all()?;
            }
            Ok(())
        })();

        // Step 2: Rename over the target (readers see old or new, never partial)
        let result = written.and_then(|()| fs::rename(&tmp_path, dir.join(name)));
        if let Err(e) = result {
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }

        Ok(())
    }

    fn remove_document(&self, collection: &str, name: &str) -> Result<bool> {
        let path = self.document_path(collection, name);
        if path.is_dir() {
            return Ok(false);
        }
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn sweep(&self) -> Result<SweepResult> {
        let mut result = SweepResult::default();

        for entry in fs::read_dir(&self.base_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            let path = entry.path();

            if name.starts_with('.') {
                if name.ends_with(TRASH_SUFFIX) {
                    match fs::remove_dir_all(&path) {
                        Ok(()) => result.trash_dirs_removed += 1,
                        Err(e) => tracing::warn!("Cannot remove trashed {}: {}", name, e),
                    }
                }
                continue;
            }

            match Self::sweep_collection(&path) {
                Ok(removed) => result.temp_files_removed += removed,
                Err(e) => tracing::warn!("Skipping sweep of collection {}: {}", name, e),
            }
        }

        Ok(result)
    }
}
