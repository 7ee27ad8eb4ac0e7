//! # BLAKE3 Hashing
//!
//! Content hashing for blocks, deploys and execution state identifiers.

use blake3::Hasher;

/// BLAKE3 hash output (256-bit).
pub type Hash = [u8; 32];

/// Incremental BLAKE3 hasher.
pub struct Blake3Hasher {
    inner: Hasher,
}

impl Blake3Hasher {
    /// Create new hasher.
    pub fn new() -> Self {
        Self {
            inner: Hasher::new(),
        }
    }

    /// Create a hasher bound to a domain-separation context.
    ///
    /// Hashes produced under different contexts never collide with each other
    /// or with plain [`blake3_hash`] output.
    pub fn with_context(context: &str) -> Self {
        Self {
            inner: Hasher::new_derive_key(context),
        }
    }

    /// Update with data.
    pub fn update(&mut self, data: &[u8]) -> &mut Self {
        self.inner.update(data);
        self
    }

    /// Finalize and return hash.
    pub fn finalize(&self) -> Hash {
        *self.inner.finalize().as_bytes()
    }
}

impl Default for Blake3Hasher {
    fn default() -> Self {
        Self::new()
    }
}

/// Hash data with BLAKE3 (one-shot).
pub fn blake3_hash(data: &[u8]) -> Hash {
    *blake3::hash(data).as_bytes()
}

/// Hash the concatenation of several inputs under a context string.
pub fn blake3_hash_many(context: &str, inputs: &[&[u8]]) -> Hash {
    let mut hasher = Blake3Hasher::with_context(context);
    for input in inputs {
        hasher.update(input);
    }
    hasher.finalize()
}
