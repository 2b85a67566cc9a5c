//! Protocol codec
//!
//! Encoding and decoding functions for the wire protocol.
//!
//! ## Wire Format
//!
//! ### Request (Command) Format
//! ```text
//! ┌──────┬───┬────────────┬───┬──────────┬───┬──────────────┬────┐
//! │ VERB │ ␠ │ collection │ ␠ │ document │ ␠ │ JSON (rest)  │ \n │
//! └──────┴───┴────────────┴───┴──────────┴───┴──────────────┴────┘
//! ```
//!
//! ### Arguments by Command Type
//! - PING, COLLECTIONS:        none
//! - CREATE, DROP, DOCUMENTS:  collection
//! - GET, DELETE:              collection, document
//! - PUT:                      collection, document, JSON object
//! - FILTER:                   collection, optional JSON object
//!
//! ### Response Format
//! ```text
//! ┌────────────┬───┬──────────────┬────┐
//! │ Status (3) │ ␠ │ JSON (rest)  │ \n │
//! └────────────┴───┴──────────────┴────┘
//! ```
//!
//! Names travel as bare tokens, so names containing whitespace cannot be
//! expressed on the wire.

use std::io::{BufRead, Read, Write};

use serde_json::Value;

use crate::document::Filter;
use crate::error::{AtlasError, Result};
use super::{Command, CommandType, Response, Status};

/// Maximum line size (16 MB)
pub const MAX_LINE_SIZE: usize = 16 * 1024 * 1024;

// =============================================================================
// Command Encoding/Decoding
// =============================================================================

/// Encode a command to a line (without the trailing newline)
///
/// Fails if a name cannot be represented as a single token.
pub fn encode_command(command: &Command) -> Result<String> {
    let verb = command.command_type().verb();

    let line = match command {
        Command::Ping | Command::ListCollections => verb.to_string(),
        Command::CreateCollection { collection }
        | Command::DropCollection { collection }
        | Command::ListDocuments { collection } => {
            format!("{} {}", verb, token(collection)?)
        }
        Command::Get { collection, name } | Command::Delete { collection, name } => {
            format!("{} {} {}", verb, token(collection)?, token(name)?)
        }
        Command::Put {
            collection,
            name,
            payload,
        } => format!(
            "{} {} {} {}",
            verb,
            token(collection)?,
            token(name)?,
            to_json(payload)?
        ),
        Command::Filter { collection, filter } => {
            if filter.is_empty() {
                format!("{} {}", verb, token(collection)?)
            } else {
                format!("{} {} {}", verb, token(collection)?, to_json(&filter.to_value())?)
            }
        }
    };

    Ok(line)
}

/// Decode a command from a single line
pub fn decode_command(line: &str) -> Result<Command> {
    let line = trim_line_end(line);
    if line.trim().is_empty() {
        return Err(AtlasError::Protocol("empty request".to_string()));
    }

    let (verb, rest) = split_token(line);
    let cmd_type = CommandType::from_verb(verb)
        .ok_or_else(|| AtlasError::Protocol(format!("unknown command: {}", verb)))?;

    // Parse arguments based on type
    match cmd_type {
        CommandType::Ping => {
            expect_end(cmd_type, rest)?;
            Ok(Command::Ping)
        }
        CommandType::ListCollections => {
            expect_end(cmd_type, rest)?;
            Ok(Command::ListCollections)
        }
        CommandType::CreateCollection
        | CommandType::DropCollection
        | CommandType::ListDocuments => {
            let (collection, rest) = required_token(cmd_type, rest, "collection")?;
            expect_end(cmd_type, rest)?;
            let collection = collection.to_string();
            Ok(match cmd_type {
                CommandType::CreateCollection => Command::CreateCollection { collection },
                CommandType::DropCollection => Command::DropCollection { collection },
                _ => Command::ListDocuments { collection },
            })
        }
        CommandType::Get | CommandType::Delete => {
            let (collection, rest) = required_token(cmd_type, rest, "collection")?;
            let (name, rest) = required_token(cmd_type, rest, "document")?;
            expect_end(cmd_type, rest)?;
            let (collection, name) = (collection.to_string(), name.to_string());
            Ok(if cmd_type == CommandType::Get {
                Command::Get { collection, name }
            } else {
                Command::Delete { collection, name }
            })
        }
        CommandType::Put => {
            let (collection, rest) = required_token(cmd_type, rest, "collection")?;
            let (name, rest) = required_token(cmd_type, rest, "document")?;
            if rest.trim().is_empty() {
                return Err(AtlasError::Protocol("PUT: missing JSON payload".to_string()));
            }
            Ok(Command::Put {
                collection: collection.to_string(),
                name: name.to_string(),
                payload: parse_json(cmd_type, rest)?,
            })
        }
        CommandType::Filter => {
            let (collection, rest) = required_token(cmd_type, rest, "collection")?;
            let filter = if rest.trim().is_empty() {
                Filter::new()
            } else {
                Filter::from_value(parse_json(cmd_type, rest)?)?
            };
            Ok(Command::Filter {
                collection: collection.to_string(),
                filter,
            })
        }
    }
}

// =============================================================================
// Response Encoding/Decoding
// =============================================================================

/// Encode a response to a line (without the trailing newline)
pub fn encode_response(response: &Response) -> String {
    // Serializing a Value cannot fail (map keys are always strings)
    let body = serde_json::to_string(&response.body).unwrap_or_else(|_| "null".to_string());
    format!("{} {}", response.status.code(), body)
}

/// Decode a response from a single line
pub fn decode_response(line: &str) -> Result<Response> {
    let line = trim_line_end(line);
    let (code, body) = split_token(line);

    let code: u16 = code
        .parse()
        .map_err(|_| AtlasError::Protocol(format!("invalid response status: {:?}", code)))?;
    let status = Status::from_code(code)
        .ok_or_else(|| AtlasError::Protocol(format!("unknown response status: {}", code)))?;

    let body = serde_json::from_str(body)
        .map_err(|e| AtlasError::Protocol(format!("invalid response body: {}", e)))?;

    Ok(Response { status, body })
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read a complete command from a stream
///
/// Blocks until a full line is received. End of stream is reported as an
/// `UnexpectedEof` I/O error.
pub fn read_command<R: BufRead>(reader: &mut R) -> Result<Command> {
    let line = read_line(reader)?;
    decode_command(&line)
}

/// Write a command to a stream
pub fn write_command<W: Write>(writer: &mut W, command: &Command) -> Result<()> {
    let line = encode_command(command)?;
    write_line(writer, &line)
}

/// Read a complete response from a stream
pub fn read_response<R: BufRead>(reader: &mut R) -> Result<Response> {
    let line = read_line(reader)?;
    decode_response(&line)
}

/// Write a response to a stream
pub fn write_response<W: Write>(writer: &mut W, response: &Response) -> Result<()> {
    write_line(writer, &encode_response(response))
}

// =============================================================================
// Private Helpers
// =============================================================================

fn read_line<R: BufRead>(reader: &mut R) -> Result<String> {
    let mut buf = Vec::new();
    let read = reader
        .by_ref()
        .take(MAX_LINE_SIZE as u64 + 1)
        .read_until(b'\n', &mut buf)?;

    if read == 0 {
        return Err(std::io::Error::from(std::io::ErrorKind::UnexpectedEof).into());
    }
    if buf.last() != Some(&b'\n') {
        if buf.len() > MAX_LINE_SIZE {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("line exceeds {} bytes", MAX_LINE_SIZE),
            )
            .into());
        }
        // Stream ended mid-line
        return Err(std::io::Error::from(std::io::ErrorKind::UnexpectedEof).into());
    }

    String::from_utf8(buf).map_err(|_| AtlasError::Protocol("line is not valid UTF-8".to_string()))
}

fn write_line<W: Write>(writer: &mut W, line: &str) -> Result<()> {
    writer.write_all(line.as_bytes())?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

fn trim_line_end(line: &str) -> &str {
    line.trim_end_matches(['\n', '\r'])
}

/// Split off the first space-delimited token
fn split_token(input: &str) -> (&str, &str) {
    let input = input.trim_start_matches(' ');
    match input.split_once(' ') {
        Some((head, tail)) => (head, tail),
        None => (input, ""),
    }
}

fn required_token<'a>(
    cmd_type: CommandType,
    input: &'a str,
    what: &str,
) -> Result<(&'a str, &'a str)> {
    let (tok, rest) = split_token(input);
    if tok.is_empty() {
        return Err(AtlasError::Protocol(format!(
            "{}: missing {} name",
            cmd_type.verb(),
            what
        )));
    }
    Ok((tok, rest))
}

fn expect_end(cmd_type: CommandType, rest: &str) -> Result<()> {
    if !rest.trim().is_empty() {
        return Err(AtlasError::Protocol(format!(
            "{}: unexpected trailing arguments",
            cmd_type.verb()
        )));
    }
    Ok(())
}

fn parse_json(cmd_type: CommandType, input: &str) -> Result<Value> {
    serde_json::from_str(input.trim())
        .map_err(|e| AtlasError::Protocol(format!("{}: invalid JSON: {}", cmd_type.verb(), e)))
}

fn to_json(value: &Value) -> Result<String> {
    serde_json::to_string(value).map_err(|e| AtlasError::InvalidPayload(e.to_string()))
}

/// A name that survives the trip as a single token
fn token(name: &str) -> Result<&str> {
    if name.is_empty() || name.chars().any(char::is_whitespace) {
        return Err(AtlasError::InvalidName(format!(
            "{:?} cannot be sent as a single token",
            name
        )));
    }
    Ok(name)
}
