//! Content fingerprints for snapshots.

use serde::Serialize;
use sha2::{Digest, Sha256};

/// Compute the SHA256 fingerprint of a serializable value.
///
/// The value is serialized to JSON first. Every map inside a snapshot is a
/// `BTreeMap`, so the JSON form (and the fingerprint) is independent of
/// insertion order. Returns a 64-character lowercase hex string.
///
/// # Errors
/// Returns an error if the value cannot be serialized to JSON.
pub fn fingerprint<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let json = serde_json::to_string(value)?;
    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}
