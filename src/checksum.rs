//! Content hashes used as schema version hashes

use sha2::{Sha256, Digest};
use serde::{Deserialize, Serialize};
use std::fmt;

/// SHA256 hash of schema content
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Checksum(String);

impl Checksum {
    /// Compute checksum from raw bytes
    pub fn from_bytes(data: &[u8]) -> Self {
        let hash = Sha256::digest(data);
        Self(format!("{:x}", hash))
    }

    /// Compute checksum from a JSON value.
    ///
    /// `serde_json` maps are ordered by key, so equal values always hash equally.
    pub fn from_json(value: &serde_json::Value) -> Self {
        let canonical = value.to_string();
        Self::from_bytes(canonical.as_bytes())
    }

    /// Get the hex string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated form for log lines
    pub fn short(&self) -> &str {
        self.0.get(..12).unwrap_or(&self.0)
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for Checksum {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Checksum {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_checksum_key_order_independent() {
        let a: serde_json::Value = serde_json::from_str(r#"{"a": 1, "b": 2}"#).unwrap();
        let b: serde_json::Value = serde_json::from_str(r#"{"b": 2, "a": 1}"#).unwrap();
        assert_eq!(Checksum::from_json(&a), Checksum::from_json(&b));
    }

    #[test]
    fn test_checksum_different_content() {
        let c1 = Checksum::from_json(&json!({"name": "test1"}));
        let c2 = Checksum::from_json(&json!({"name": "test2"}));
        assert_ne!(c1, c2);
    }

    #[test]
    fn test_short_on_hand_edited_hash() {
        // hashes read from edited files are not guaranteed to be hex
        let c = Checksum::from("aéééééééé");
        assert_eq!(c.short(), c.as_str());
        assert_eq!(Checksum::from("abc").short(), "abc");
    }

    #[test]
    fn test_short_and_serde() {
        let c = Checksum::from_bytes(b"payload");
        assert_eq!(c.short().len(), 12);
        assert!(c.as_str().starts_with(c.short()));

        let encoded = serde_json::to_string(&c).unwrap();
        assert_eq!(encoded, format!("\"{}\"", c));
    }
}
