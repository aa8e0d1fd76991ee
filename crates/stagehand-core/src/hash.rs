//! Content hashing for deterministic playback verification.
//!
//! Produces SHA-256 digests of serialized scene state, so two runs of the
//! same timeline can be compared bit for bit.

use sha2::{Digest, Sha256};

/// A content hash digest (SHA-256, 32 bytes).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentHash {
    bytes: [u8; 32],
}

impl ContentHash {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self { bytes }
    }

    pub fn to_hex(&self) -> String {
        self.bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }
}

impl std::fmt::Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Hash a single byte payload.
pub fn hash_bytes(data: &[u8]) -> ContentHash {
    hash_chunks(std::iter::once(data))
}

/// Hash a sequence of payloads. Each chunk is length-prefixed so that
/// `["ab", "c"]` and `["a", "bc"]` differ.
pub fn hash_chunks<'a>(chunks: impl IntoIterator<Item = &'a [u8]>) -> ContentHash {
    let mut hasher = Sha256::new();
    for chunk in chunks {
        hasher.update((chunk.len() as u64).to_le_bytes());
        hasher.update(chunk);
    }
    ContentHash::from_bytes(hasher.finalize().into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_deterministic() {
        assert_eq!(hash_bytes(b"scene"), hash_bytes(b"scene"));
        assert_ne!(hash_bytes(b"scene"), hash_bytes(b"scene2"));
    }

    #[test]
    fn test_chunk_boundaries_matter() {
        let a = hash_chunks([b"ab".as_slice(), b"c".as_slice()]);
        let b = hash_chunks([b"a".as_slice(), b"bc".as_slice()]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_hex_length() {
        assert_eq!(hash_bytes(&[]).to_hex().len(), 64);
    }
}
