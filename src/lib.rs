//! # AtlasDoc
//!
//! A minimal document store with:
//! - Named collections (directories) of JSON documents (one file each)
//! - Create-or-merge updates with a stable `uuid` per document
//! - Unindexed equality filtering (linear scan)
//! - One global lock serializing every storage call
//! - Line-oriented TCP client protocol
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TCP Server                              │
//! │           (Acceptor + Thread per Connection)                 │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │  line protocol
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                       Engine                                 │
//! │     (Global Mutex, merge, filter, name validation)           │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │  DiskStore  │          │ MemoryStore │
//!   │ (tmp+rename)│          │  (tests)    │
//!   └─────────────┘          └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod document;
pub mod storage;
pub mod network;
pub mod protocol;
pub mod engine;
pub mod client;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{AtlasError, Result};
pub use config::Config;
pub use engine::Engine;
pub use client::Client;
pub use document::{Document, Filter};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of AtlasDoc
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
