//! Protocol Module
//!
//! Defines the wire protocol for client-server communication.
//!
//! ## Protocol Format (V1 - Line Oriented)
//!
//! One UTF-8 line per request, one per response, `\n` terminated.
//!
//! ### Request Format
//! ```text
//! VERB [collection] [document] [json...]
//! ```
//!
//! ### Commands
//! - PING                        - health check
//! - COLLECTIONS                 - list collections
//! - CREATE <c>                  - create collection
//! - DROP <c>                    - delete collection and its documents
//! - DOCUMENTS <c>               - list document names
//! - GET <c> <d>                 - read document
//! - PUT <c> <d> <json object>   - create or merge-update document
//! - DELETE <c> <d>              - delete document
//! - FILTER <c> [<json object>]  - equality filter (linear scan)
//!
//! ### Response Format
//! ```text
//! STATUS JSON
//! ```
//!
//! ### Status Codes
//! - 200: OK
//! - 400: BAD_REQUEST (invalid name/payload, already exists, malformed line)
//! - 404: NOT_FOUND
//! - 500: ERROR (corrupt document, storage failure)

mod command;
mod response;
mod codec;

pub use command::{Command, CommandType};
pub use response::{Response, Status};
pub use codec::{
    decode_command, decode_response, encode_command, encode_response, read_command,
    read_response, write_command, write_response, MAX_LINE_SIZE,
};
