//! Input validation utilities.
//!
//! Identifiers arriving from route parameters and hidden form fields end up as storage path
//! components, so they are checked before any store is touched.

use crate::constants::MAX_IDENTIFIER_LEN;
use crate::{HmsError, HmsResult};

/// Validates that an identifier is safe to use as a single path component.
///
/// - Rejects empty or whitespace-only strings
/// - Bounds the length
/// - Restricts characters to ASCII alphanumerics, `-` and `_`
///
/// # Errors
///
/// Returns [`HmsError::InvalidInput`] naming `what` if the identifier is invalid.
pub fn validate_identifier_safe_for_path(what: &str, identifier: &str) -> HmsResult<()> {
    if identifier.trim().is_empty() {
        return Err(HmsError::InvalidInput(format!("{what} cannot be empty")));
    }

    if identifier.len() > MAX_IDENTIFIER_LEN {
        return Err(HmsError::InvalidInput(format!(
            "{what} exceeds maximum length of {MAX_IDENTIFIER_LEN} characters"
        )));
    }

    let ok = identifier
        .bytes()
        .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'z' | b'A'..=b'Z' | b'-' | b'_'));

    if !ok {
        return Err(HmsError::InvalidInput(format!(
            "{what} contains invalid characters (only alphanumeric, '-', '_' allowed)"
        )));
    }

    Ok(())
}
