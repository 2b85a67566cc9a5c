//! Name validation
//!
//! Collection and document names become single path components, so anything
//! that could escape the base directory or collide with engine-owned files is
//! rejected here rather than trusted from the transport.

use crate::error::{AtlasError, Result};

/// Longest accepted name in bytes (common filesystem component limit)
pub const MAX_NAME_LEN: usize = 255;

/// Validate a collection or document name
///
/// Rejected:
/// - empty names, `.` and `..`
/// - names starting with `.` (reserved for temp and trash entries)
/// - path separators, NUL and other control characters
/// - names longer than `MAX_NAME_LEN` bytes
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(AtlasError::InvalidName("name must not be empty".to_string()));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(AtlasError::InvalidName(format!(
            "name longer than {} bytes",
            MAX_NAME_LEN
        )));
    }
    if name.starts_with('.') {
        return Err(AtlasError::InvalidName(format!(
            "'{}': names must not start with '.'",
            name
        )));
    }
    if let Some(ch) = name
        .chars()
        .find(|&ch| matches!(ch, '/' | '\\') || ch.is_control())
    {
        return Err(AtlasError::InvalidName(format!(
            "'{}': character {:?} is not allowed",
            name.escape_debug(),
            ch
        )));
    }
    Ok(())
}
