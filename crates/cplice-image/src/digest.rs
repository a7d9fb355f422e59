//! Content digests (`sha256:<hex>`)

use sha2::{Digest, Sha256};

/// Algorithm prefix for SHA-256 digests
pub const SHA256_PREFIX: &str = "sha256:";

/// Canonical digest of `data`: `sha256:` followed by 64 lowercase hex chars
pub fn sha256_digest(data: &[u8]) -> String {
    format!("{}{}", SHA256_PREFIX, hex::encode(Sha256::digest(data)))
}

/// Check `data` against `expected`
///
/// Returns `None` when the digest matches or uses an algorithm other than
/// sha256, otherwise the digest actually computed.
pub fn verify(expected: &str, data: &[u8]) -> Option<String> {
    if !expected.starts_with(SHA256_PREFIX) {
        return None;
    }
    let actual = sha256_digest(data);
    (actual != expected).then_some(actual)
}
