//! Response definitions
//!
//! Represents responses to clients.

use serde_json::{json, Value};

use crate::error::AtlasError;

/// Response status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum Status {
    Ok = 200,
    BadRequest = 400,
    NotFound = 404,
    Error = 500,
}

impl Status {
    /// Numeric code on the wire
    pub fn code(self) -> u16 {
        self as u16
    }

    /// Parse a numeric code
    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            200 => Some(Status::Ok),
            400 => Some(Status::BadRequest),
            404 => Some(Status::NotFound),
            500 => Some(Status::Error),
            _ => None,
        }
    }
}

/// A response to send to client
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// Status code
    pub status: Status,

    /// JSON body (result on OK, `{"error": ...}` otherwise)
    pub body: Value,
}

impl Response {
    /// Create an OK response carrying a result
    pub fn ok(body: Value) -> Self {
        Self {
            status: Status::Ok,
            body,
        }
    }

    /// Create an OK response carrying a human-readable message
    pub fn message(text: impl Into<String>) -> Self {
        Self::ok(json!({ "message": text.into() }))
    }

    /// Create a NOT_FOUND response
    pub fn not_found(message: &str) -> Self {
        Self::failure(Status::NotFound, message)
    }

    /// Create an ERROR response
    pub fn error(message: &str) -> Self {
        Self::failure(Status::Error, message)
    }

    /// Build the response for an engine or protocol error
    ///
    /// Never includes filesystem paths or OS error text.
    pub fn from_error(error: &AtlasError) -> Self {
        let status = Status::from_code(error.status()).unwrap_or(Status::Error);
        Self::failure(status, &error.public_message())
    }

    /// Is this a 200 response?
    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }

    /// Error message of a failed response
    pub fn error_message(&self) -> Option<&str> {
        self.body.get("error").and_then(Value::as_str)
    }

    fn failure(status: Status, message: &str) -> Self {
        Self {
            status,
            body: json!({ "error": message }),
        }
    }
}
