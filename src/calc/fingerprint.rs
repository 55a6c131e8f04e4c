use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt::Write;

/// Lowercase hex SHA-256 of the compact JSON encoding of `value`.
///
/// Callers compare it against the hash of what they last committed, so a
/// recompute that changed nothing can skip the write.
pub fn result_hash<T: Serialize>(value: &T) -> anyhow::Result<String> {
    let bytes = serde_json::to_vec(value)?;
    let digest = Sha256::digest(&bytes);
    let mut out = String::with_capacity(digest.len() * 2);
    for b in digest.iter() {
        write!(out, "{:02x}", b)?;
    }
    Ok(out)
}
