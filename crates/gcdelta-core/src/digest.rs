//! SHA256 digests for snapshots and op lists.
//!
//! - **Text digest**: hash of one serialized snapshot
//! - **Ops digest**: hash of the canonical JSON of an op list
//! - **History digest**: hash of the ordered step digests
//!
//! Every digest is order-sensitive and lowercase hex (64 characters).

use crate::diff::ChangeOp;
use crate::errors::Result;
use sha2::{Digest, Sha256};

/// Digest of one serialized snapshot.
pub fn text_digest(text: &str) -> String {
    hash_string(text)
}

/// Digest of an op list.
///
/// # Errors
///
/// Returns `DeltaError::Serialization` if JSON serialization fails.
pub fn compute_ops_digest(ops: &[ChangeOp]) -> Result<String> {
    let canonical = serde_json::to_string(ops)?;
    Ok(hash_string(&canonical))
}

/// Digest of a history, given its step digests in order.
///
/// # Errors
///
/// Returns `DeltaError::Serialization` if JSON serialization fails.
pub fn compute_history_digest(step_digests: &[String]) -> Result<String> {
    let canonical = serde_json::to_string(step_digests)?;
    Ok(hash_string(&canonical))
}

fn hash_string(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_digest_is_sha256_hex() {
        assert_eq!(
            text_digest(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_history_digest_is_order_sensitive() {
        let a = vec!["x".to_string(), "y".to_string()];
        let b = vec!["y".to_string(), "x".to_string()];
        assert_ne!(
            compute_history_digest(&a).unwrap(),
            compute_history_digest(&b).unwrap()
        );
    }
}
