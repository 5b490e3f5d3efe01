//! Component keys.
//!
//! Canonical definitions are addressed by numeric id; OpenAPI component
//! stores are name-keyed. The generator writes `<sanitized-name>-<id>` keys
//! so two definitions sharing a display name stay distinct, and the parser
//! inverts that: a trailing numeric suffix restores the original id, any
//! other key hashes to a stable derived id.

use sha2::{Digest, Sha256};

/// Strip everything outside `[A-Za-z0-9._-]`. An empty result falls back to
/// the given placeholder.
pub(crate) fn sanitize_name(name: &str, fallback: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();
    if cleaned.is_empty() {
        fallback.to_string()
    } else {
        cleaned
    }
}

/// The component-store key for a definition.
pub(crate) fn component_key(name: &str, id: i64, fallback: &str) -> String {
    format!("{}-{id}", sanitize_name(name, fallback))
}

/// Invert [`component_key`]: split a trailing `-<digits>` suffix back into
/// `(name, id)`. Keys without the suffix come from foreign documents and get
/// a derived id that is stable across parses.
pub(crate) fn key_to_id(key: &str) -> (String, i64) {
    if let Some((name, digits)) = key.rsplit_once('-') {
        if !name.is_empty() {
            if let Ok(id) = digits.parse::<i64>() {
                if id > 0 {
                    return (name.to_string(), id);
                }
            }
        }
    }
    (key.to_string(), stable_id(key))
}

/// Derive a positive id from arbitrary text. Same input, same id.
pub(crate) fn stable_id(text: &str) -> i64 {
    let digest = Sha256::digest(text.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    // Clear the sign bit so the id stays positive.
    (i64::from_be_bytes(bytes) & i64::MAX).max(1)
}
