//! Tests for the file-store backends
//!
//! These tests verify:
//! - DiskStore directory/file mapping
//! - Atomic replace and hidden temp files
//! - Collection removal via trash rename
//! - Startup sweep of leftovers
//! - MemoryStore follows the same contract

use std::fs;
use std::path::PathBuf;

use atlasdoc::storage::{DiskStore, FileStore, MemoryStore, SweepResult};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_disk_store() -> (TempDir, PathBuf, DiskStore) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().to_path_buf();
    let store = DiskStore::open(&path, true).unwrap();
    (temp_dir, path, store)
}

/// Contract checks shared by both backends
fn exercise_contract(store: &dyn FileStore) {
    assert!(store.list_collections().unwrap().is_empty());
    assert!(!store.collection_exists("c").unwrap());

    assert!(store.create_collection("c").unwrap());
    assert!(!store.create_collection("c").unwrap());
    assert!(store.collection_exists("c").unwrap());

    assert_eq!(store.read_document("c", "d").unwrap(), None);
    assert!(store.replace_document("missing", "d", b"{}").is_err());
    assert!(!store.collection_exists("missing").unwrap());
    store.replace_document("c", "d", b"{\"v\":1}").unwrap();
    store.replace_document("c", "d", b"{\"v\":2}").unwrap();
    assert_eq!(store.read_document("c", "d").unwrap(), Some(b"{\"v\":2}".to_vec()));
    assert_eq!(store.list_documents("c").unwrap(), vec!["d".to_string()]);

    assert!(store.remove_document("c", "d").unwrap());
    assert!(!store.remove_document("c", "d").unwrap());
    assert!(store.list_documents("c").unwrap().is_empty());

    store.replace_document("c", "e", b"{}").unwrap();
    assert!(store.remove_collection("c").unwrap());
    assert!(!store.remove_collection("c").unwrap());
    assert!(!store.collection_exists("c").unwrap());
    assert_eq!(store.read_document("c", "e").unwrap(), None);
}

// =============================================================================
// Contract Tests
// =============================================================================

#[test]
fn test_disk_store_contract() {
    let (_temp, _path, store) = setup_disk_store();
    exercise_contract(&store);
}

#[test]
fn test_memory_store_contract() {
    let store = MemoryStore::new();
    exercise_contract(&store);
}

// =============================================================================
// DiskStore Layout Tests
// =============================================================================

#[test]
fn test_open_creates_base_dir() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("data");

    let store = DiskStore::open(&path, false).unwrap();

    assert!(path.is_dir());
    assert_eq!(store.base_dir(), path.as_path());
}

#[test]
fn test_document_is_plain_file() {
    let (_temp, path, store) = setup_disk_store();
    store.create_collection("users").unwrap();

    store.replace_document("users", "alice", b"{\"a\":1}\n").unwrap();

    assert_eq!(
        fs::read(path.join("users").join("alice")).unwrap(),
        b"{\"a\":1}\n"
    );
}

#[test]
fn test_replace_leaves_no_temp_file() {
    let (_temp, path, store) = setup_disk_store();
    store.create_collection("c").unwrap();

    for i in 0..5 {
        store.replace_document("c", "d", format!("{{\"i\":{}}}", i).as_bytes()).unwrap();
    }

    let names: Vec<String> = fs::read_dir(path.join("c"))
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    assert_eq!(names, vec!["d".to_string()]);
}

#[test]
fn test_listing_skips_hidden_and_wrong_types() {
    let (_temp, path, store) = setup_disk_store();
    store.create_collection("c").unwrap();
    store.replace_document("c", "doc", b"{}").unwrap();

    fs::write(path.join("file-at-root"), b"x").unwrap();
    fs::create_dir(path.join(".hidden-dir")).unwrap();
    fs::write(path.join("c").join(".doc.abc.tmp"), b"{").unwrap();
    fs::create_dir(path.join("c").join("nested")).unwrap();

    assert_eq!(store.list_collections().unwrap(), vec!["c".to_string()]);
    assert_eq!(store.list_documents("c").unwrap(), vec!["doc".to_string()]);
}

#[test]
fn test_directory_is_not_a_document() {
    let (_temp, path, store) = setup_disk_store();
    store.create_collection("c").unwrap();
    fs::create_dir(path.join("c").join("sub")).unwrap();

    assert_eq!(store.read_document("c", "sub").unwrap(), None);
    assert!(!store.remove_document("c", "sub").unwrap());
    assert!(path.join("c").join("sub").is_dir());
}

#[test]
fn test_file_is_not_a_collection() {
    let (_temp, path, store) = setup_disk_store();
    fs::write(path.join("plain"), b"x").unwrap();

    assert!(!store.collection_exists("plain").unwrap());
    assert!(!store.remove_collection("plain").unwrap());
    assert!(path.join("plain").exists());
}

#[test]
fn test_remove_collection_frees_name_immediately() {
    let (_temp, path, store) = setup_disk_store();
    store.create_collection("c").unwrap();
    store.replace_document("c", "d", b"{}").unwrap();

    assert!(store.remove_collection("c").unwrap());
    assert!(store.create_collection("c").unwrap());

    assert!(store.list_documents("c").unwrap().is_empty());
    assert_eq!(fs::read_dir(&path).unwrap().count(), 1);
}

// =============================================================================
// Sweep Tests
// =============================================================================

#[test]
fn test_sweep_removes_leftovers() {
    let (_temp, path, store) = setup_disk_store();
    store.create_collection("c").unwrap();
    store.replace_document("c", "keep", b"{}").unwrap();

    fs::write(path.join("c").join(".keep.1.tmp"), b"{").unwrap();
    fs::write(path.join("c").join(".other.2.tmp"), b"").unwrap();
    fs::create_dir(path.join(".gone.3.trash")).unwrap();
    fs::write(path.join(".gone.3.trash").join("doc"), b"{}").unwrap();

    let result = store.sweep().unwrap();

    assert_eq!(
        result,
        SweepResult {
            temp_files_removed: 2,
            trash_dirs_removed: 1,
        }
    );
    assert!(!path.join(".gone.3.trash").exists());
    assert_eq!(store.read_document("c", "keep").unwrap(), Some(b"{}".to_vec()));
}

#[test]
fn test_sweep_leaves_foreign_hidden_dirs() {
    let (_temp, path, store) = setup_disk_store();
    fs::create_dir(path.join(".git")).unwrap();
    fs::write(path.join(".git").join(".index.lock.tmp"), b"x").unwrap();
    fs::create_dir(path.join(".cache")).unwrap();

    assert_eq!(store.sweep().unwrap(), SweepResult::default());

    assert!(path.join(".git").join(".index.lock.tmp").exists());
    assert!(path.join(".cache").is_dir());
}

#[test]
fn test_leftover_trash_is_invisible_until_swept() {
    let (_temp, path, store) = setup_disk_store();
    // A removal whose content deletion failed after the rename
    fs::create_dir(path.join(".c.abc.trash")).unwrap();
    fs::write(path.join(".c.abc.trash").join("doc"), b"{}").unwrap();

    assert!(store.list_collections().unwrap().is_empty());
    assert!(!store.collection_exists("c").unwrap());
    assert!(store.create_collection("c").unwrap());
    assert!(store.list_documents("c").unwrap().is_empty());

    assert_eq!(store.sweep().unwrap().trash_dirs_removed, 1);
    assert!(!path.join(".c.abc.trash").exists());
    assert!(store.collection_exists("c").unwrap());
}

#[test]
fn test_sweep_on_clean_store() {
    let (_temp, _path, store) = setup_disk_store();
    store.create_collection("c").unwrap();

    assert_eq!(store.sweep().unwrap(), SweepResult::default());
}

#[test]
fn test_memory_store_insert_raw() {
    let store = MemoryStore::new();

    store.insert_raw("c", "d", "garbage");

    assert!(store.collection_exists("c").unwrap());
    assert_eq!(store.read_document("c", "d").unwrap(), Some(b"garbage".to_vec()));
    assert_eq!(store.document_count(), 1);
}
