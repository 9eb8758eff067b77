//! Accumulator member encoding
//!
//! Arbitrary credential bytes are encoded into fixed-width elements before
//! they enter the accumulator. Elements are ordered and hashable so they can
//! key the issuer-side witness tables.

use serde::{Deserialize, Serialize};

/// Domain separation for member encoding
const ELEMENT_CONTEXT: &str = "revmesh-accumulator v1 element";

/// A fixed-width encoded accumulator member
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Element([u8; 32]);

impl Element {
    /// Encode arbitrary bytes (a credential identifier) as an accumulator member
    pub fn encode(bytes: &[u8]) -> Self {
        Self(blake3::derive_key(ELEMENT_CONTEXT, bytes))
    }

    /// Raw encoded bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Short hex prefix used in error messages and logs
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl std::fmt::Display for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoding_is_deterministic() {
        assert_eq!(Element::encode(b"credential-7"), Element::encode(b"credential-7"));
    }

    #[test]
    fn test_distinct_inputs_encode_distinct_elements() {
        assert_ne!(Element::encode(b"credential-1"), Element::encode(b"credential-2"));
    }

    #[test]
    fn test_display_is_full_hex() {
        let el = Element::encode(b"x");
        let shown = format!("{}", el);
        assert_eq!(shown.len(), 64);
        assert!(shown.starts_with(&el.short_hex()));
    }
}
