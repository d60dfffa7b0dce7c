//! Sanitization for caller-supplied lookup keys.
//!
//! Applied before untrusted strings enter query construction. The collection
//! layer assumes keys handed to it are already validated and performs no
//! re-validation.

use crate::error::ApiError;

/// Longest accepted key. POS identifiers are short; anything beyond this is
/// almost certainly not one.
pub const MAX_KEY_LEN: usize = 64;

/// Trim and validate a string destined for a query parameter or lookup key.
///
/// Accepts ASCII alphanumerics plus `.`, `_` and `-`; rejects empty,
/// over-long, and everything else with [`ApiError::InvalidKey`].
pub fn sanitize_key(raw: &str) -> Result<String, ApiError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ApiError::InvalidKey("empty key".to_string()));
    }
    if trimmed.len() > MAX_KEY_LEN {
        return Err(ApiError::InvalidKey(format!("key longer than {MAX_KEY_LEN} bytes")));
    }
    if !trimmed.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')) {
        return Err(ApiError::InvalidKey(format!("key contains disallowed characters: {trimmed:?}")));
    }
    Ok(trimmed.to_string())
}
