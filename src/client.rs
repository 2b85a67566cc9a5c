//! Client
//!
//! Blocking TCP client for the line protocol. Performs no storage logic of
//! its own: every call is one request line and one response line.

use std::io::{BufReader, BufWriter};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use serde_json::Value;

use crate::document::{Document, Filter};
use crate::error::{AtlasError, Result};
use crate::protocol::{read_response, write_command, Command, Response};

/// A connection to an AtlasDoc server
pub struct Client {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
}

impl Client {
    /// Connect to a server
    pub fn connect(addr: impl ToSocketAddrs) -> Result<Self> {
        let stream = TcpStream::connect(addr)?;
        stream.set_nodelay(true)?;

        Ok(Self {
            reader: BufReader::new(stream.try_clone()?),
            writer: BufWriter::new(stream),
        })
    }

    /// Set a read/write timeout on the underlying socket
    pub fn set_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        let stream = self.reader.get_ref();
        stream.set_read_timeout(timeout)?;
        stream.set_write_timeout(timeout)?;
        Ok(())
    }

    /// Send a command and return the raw response
    pub fn send(&mut self, command: &Command) -> Result<Response> {
        write_command(&mut self.writer, command)?;
        read_response(&mut self.reader)
    }

    /// Send a command and return the body of a successful response
    fn call(&mut self, command: Command) -> Result<Value> {
        let response = self.send(&command)?;
        if response.is_ok() {
            return Ok(response.body);
        }

        let message = response
            .error_message()
            .unwrap_or("unknown error")
            .to_string();
        Err(AtlasError::Server {
            status: response.status.code(),
            message,
        })
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Health check
    pub fn ping(&mut self) -> Result<()> {
        self.call(Command::Ping).map(|_| ())
    }

    pub fn list_collections(&mut self) -> Result<Vec<String>> {
        let body = self.call(Command::ListCollections)?;
        names(body)
    }

    pub fn create_collection(&mut self, collection: &str) -> Result<()> {
        self.call(Command::CreateCollection {
            collection: collection.to_string(),
        })
        .map(|_| ())
    }

    pub fn delete_collection(&mut self, collection: &str) -> Result<()> {
        self.call(Command::DropCollection {
            collection: collection.to_string(),
        })
        .map(|_| ())
    }

    pub fn list_documents(&mut self, collection: &str) -> Result<Vec<String>> {
        let body = self.call(Command::ListDocuments {
            collection: collection.to_string(),
        })?;
        names(body)
    }

    pub fn get_document(&mut self, collection: &str, name: &str) -> Result<Document> {
        let body = self.call(Command::Get {
            collection: collection.to_string(),
            name: name.to_string(),
        })?;
        object(body)
    }

    /// Create or merge-update a document; returns the stored result
    pub fn put_document(&mut self, collection: &str, name: &str, payload: Value) -> Result<Document> {
        let body = self.call(Command::Put {
            collection: collection.to_string(),
            name: name.to_string(),
            payload,
        })?;
        object(body)
    }

    pub fn delete_document(&mut self, collection: &str, name: &str) -> Result<()> {
        self.call(Command::Delete {
            collection: collection.to_string(),
            name: name.to_string(),
        })
        .map(|_| ())
    }

    pub fn filter_documents(&mut self, collection: &str, filter: Filter) -> Result<Vec<Document>> {
        let body = self.call(Command::Filter {
            collection: collection.to_string(),
            filter,
        })?;
        match body {
            Value::Array(items) => items.into_iter().map(object).collect(),
            other => Err(unexpected("array of documents", &other)),
        }
    }
}

fn names(body: Value) -> Result<Vec<String>> {
    serde_json::from_value(body)
        .map_err(|e| AtlasError::Protocol(format!("expected array of names: {}", e)))
}

fn object(body: Value) -> Result<Document> {
    match body {
        Value::Object(map) => Ok(map),
        other => Err(unexpected("document object", &other)),
    }
}

fn unexpected(expected: &str, got: &Value) -> AtlasError {
    AtlasError::Protocol(format!("expected {}, got {}", expected, got))
}
