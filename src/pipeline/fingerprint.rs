//! Schema fingerprinting
//!
//! A fingerprint is the SHA-256 digest of an ordered column list. Two schemas
//! share a fingerprint only if they have the same names in the same order.

use sha2::{Digest, Sha256};

/// Number of hex characters shown when a fingerprint is displayed
pub const SHORT_FINGERPRINT_LEN: usize = 12;

/// Compute the hex-encoded SHA-256 fingerprint of an ordered column list.
pub fn schema_fingerprint<S: AsRef<str>>(columns: &[S]) -> String {
    let mut hasher = Sha256::new();
    for name in columns {
        hasher.update(name.as_ref().as_bytes());
        // Terminator keeps ["ab", "c"] and ["a", "bc"] apart
        hasher.update([0u8]);
    }
    hex::encode(hasher.finalize())
}

/// Abbreviated fingerprint for display
pub fn short_fingerprint(fingerprint: &str) -> &str {
    let end = fingerprint.len().min(SHORT_FINGERPRINT_LEN);
    &fingerprint[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_is_sha256_hex() {
        let fp = schema_fingerprint(&["Age", "Occupation"]);
        assert_eq!(fp.len(), 64);
        assert!(fp.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_fingerprint_depends_on_order() {
        let a = schema_fingerprint(&["a", "b"]);
        let b = schema_fingerprint(&["b", "a"]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_fingerprint_separates_names() {
        let a = schema_fingerprint(&["ab", "c"]);
        let b = schema_fingerprint(&["a", "bc"]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_fingerprint_is_deterministic() {
        let columns = vec!["x".to_string(), "y".to_string()];
        assert_eq!(schema_fingerprint(&columns), schema_fingerprint(&columns));
    }

    #[test]
    fn test_short_fingerprint() {
        let fp = schema_fingerprint(&["a"]);
        assert_eq!(short_fingerprint(&fp).len(), SHORT_FINGERPRINT_LEN);
        assert_eq!(short_fingerprint("abc"), "abc");
    }
}
