//! Content hashing for model identity and pass-config keys
//!
//! All hashes are BLAKE3 over the JCS (RFC 8785) canonical form of a JSON
//! value, so semantically equal configurations hash identically regardless
//! of key order in their source representation.

use anyhow::{Context, Result};
use serde::Serialize;

/// Number of hex characters kept for short config hashes embedded in model
/// ids and run filenames.
pub const SHORT_HASH_LEN: usize = 8;

/// BLAKE3 hex digest of the canonical JSON form of `value`.
pub fn hash_json(value: &serde_json::Value) -> Result<String> {
    let canonical =
        serde_json_canonicalizer::to_vec(value).context("Failed to canonicalize JSON for hashing")?;
    Ok(blake3::hash(&canonical).to_hex().to_string())
}

/// Hash any serializable value via its JSON representation.
pub fn hash_serializable<T: Serialize>(value: &T) -> Result<String> {
    let json = serde_json::to_value(value).context("Failed to serialize value for hashing")?;
    hash_json(&json)
}

/// Short (8 hex char) hash of a JSON value, used in derived model ids.
pub fn short_hash_json(value: &serde_json::Value) -> Result<String> {
    let mut digest = hash_json(value)?;
    digest.truncate(SHORT_HASH_LEN);
    Ok(digest)
}
