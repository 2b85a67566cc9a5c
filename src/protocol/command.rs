//! Command definitions
//!
//! Represents commands from clients.

use serde_json::Value;

use crate::document::Filter;

/// Command types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandType {
    Ping,
    ListCollections,
    CreateCollection,
    DropCollection,
    ListDocuments,
    Get,
    Put,
    Delete,
    Filter,
}

impl CommandType {
    /// Wire verb
    pub fn verb(&self) -> &'static str {
        match self {
            CommandType::Ping => "PING",
            CommandType::ListCollections => "COLLECTIONS",
            CommandType::CreateCollection => "CREATE",
            CommandType::DropCollection => "DROP",
            CommandType::ListDocuments => "DOCUMENTS",
            CommandType::Get => "GET",
            CommandType::Put => "PUT",
            CommandType::Delete => "DELETE",
            CommandType::Filter => "FILTER",
        }
    }

    /// Parse a wire verb (case-insensitive)
    pub fn from_verb(verb: &str) -> Option<Self> {
        let ty = match verb.to_ascii_uppercase().as_str() {
            "PING" => CommandType::Ping,
            "COLLECTIONS" => CommandType::ListCollections,
            "CREATE" => CommandType::CreateCollection,
            "DROP" => CommandType::DropCollection,
            "DOCUMENTS" => CommandType::ListDocuments,
            "GET" => CommandType::Get,
            "PUT" => CommandType::Put,
            "DELETE" => CommandType::Delete,
            "FILTER" => CommandType::Filter,
            _ => return None,
        };
        Some(ty)
    }
}

/// A parsed command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Ping (health check)
    Ping,

    /// List all collections
    ListCollections,

    /// Create an empty collection
    CreateCollection { collection: String },

    /// Delete a collection and everything in it
    DropCollection { collection: String },

    /// List document names in a collection
    ListDocuments { collection: String },

    /// Read a document
    Get { collection: String, name: String },

    /// Create a document or merge into an existing one
    Put {
        collection: String,
        name: String,
        payload: Value,
    },

    /// Delete a document
    Delete { collection: String, name: String },

    /// Return all documents matching an equality filter
    Filter { collection: String, filter: Filter },
}

impl Command {
    /// Get the command type
    pub fn command_type(&self) -> CommandType {
        match self {
            Command::Ping => CommandType::Ping,
            Command::ListCollections => CommandType::ListCollections,
            Command::CreateCollection { .. } => CommandType::CreateCollection,
            Command::DropCollection { .. } => CommandType::DropCollection,
            Command::ListDocuments { .. } => CommandType::ListDocuments,
            Command::Get { .. } => CommandType::Get,
            Command::Put { .. } => CommandType::Put,
            Command::Delete { .. } => CommandType::Delete,
            Command::Filter { .. } => CommandType::Filter,
        }
    }
}
