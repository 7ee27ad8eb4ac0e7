//! Crypto error types.

use thiserror::Error;

/// Cryptographic operation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    /// Signature verification failed
    #[error("Signature verification failed")]
    SignatureVerificationFailed,

    /// Invalid signature encoding
    #[error("Invalid signature: expected 64 bytes, got {0}")]
    InvalidSignatureLength(usize),

    /// Signature bytes are not a valid (r, s) pair
    #[error("Invalid signature")]
    InvalidSignature,

    /// Invalid public key
    #[error("Invalid public key")]
    InvalidPublicKey,

    /// Invalid private key
    #[error("Invalid private key")]
    InvalidPrivateKey,
}
