//! # ECDSA Signatures (secp256k1)
//!
//! Validator keys and block signatures.
//!
//! A validator is identified by its 33-byte compressed public key; it signs
//! the 32-byte content hash of every block it creates.
//!
//! - RFC 6979 deterministic nonces (no RNG dependency for signing)
//! - Low-S normalization on verify

use crate::CryptoError;
use k256::ecdsa::{
    signature::{Signer, Verifier},
    Signature, SigningKey, VerifyingKey,
};
use zeroize::Zeroize;

/// Compressed secp256k1 public key (33 bytes).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Secp256k1PublicKey([u8; 33]);

impl Secp256k1PublicKey {
    /// Create from compressed bytes (33 bytes, starting with 0x02 or 0x03).
    pub fn from_bytes(bytes: [u8; 33]) -> Result<Self, CryptoError> {
        VerifyingKey::from_sec1_bytes(&bytes).map_err(|_| CryptoError::InvalidPublicKey)?;
        Ok(Self(bytes))
    }

    /// Get raw compressed bytes.
    pub fn as_bytes(&self) -> &[u8; 33] {
        &self.0
    }

    /// Verify a signature over `message`.
    pub fn verify(
        &self,
        message: &[u8],
        signature: &Secp256k1Signature,
    ) -> Result<(), CryptoError> {
        let verifying_key =
            VerifyingKey::from_sec1_bytes(&self.0).map_err(|_| CryptoError::InvalidPublicKey)?;

        let sig = Signature::from_slice(&signature.0).map_err(|_| CryptoError::InvalidSignature)?;
        // High-S signatures are malleable copies of a valid one.
        let sig = sig.normalize_s().unwrap_or(sig);

        verifying_key
            .verify(message, &sig)
            .map_err(|_| CryptoError::SignatureVerificationFailed)
    }
}

/// ECDSA signature (64 bytes, r||s format).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Secp256k1Signature([u8; 64]);

impl Secp256k1Signature {
    /// Create from bytes (64 bytes).
    pub fn from_bytes(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }

    /// Create from a byte slice, checking its length.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let raw: [u8; 64] = bytes
            .try_into()
            .map_err(|_| CryptoError::InvalidSignatureLength(bytes.len()))?;
        Ok(Self(raw))
    }

    /// Get raw bytes.
    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }

    /// Copy into an owned vector, the form stored on a block.
    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }
}

/// secp256k1 ECDSA keypair held by a validator.
pub struct Secp256k1KeyPair {
    signing_key: SigningKey,
}

impl Secp256k1KeyPair {
    /// Generate random keypair.
    pub fn generate() -> Self {
        let signing_key = SigningKey::random(&mut rand::thread_rng());
        Self { signing_key }
    }

    /// Create from secret key bytes (32 bytes).
    pub fn from_bytes(bytes: [u8; 32]) -> Result<Self, CryptoError> {
        let signing_key =
            SigningKey::from_bytes((&bytes).into()).map_err(|_| CryptoError::InvalidPrivateKey)?;
        Ok(Self { signing_key })
    }

    /// Get public key (compressed, 33 bytes).
    pub fn public_key(&self) -> Secp256k1PublicKey {
        let point = self.signing_key.verifying_key().to_encoded_point(true);
        let mut bytes = [0u8; 33];
        bytes.copy_from_slice(point.as_bytes());
        Secp256k1PublicKey(bytes)
    }

    /// Sign a message (deterministic RFC 6979).
    pub fn sign(&self, message: &[u8]) -> Secp256k1Signature {
        let sig: Signature = self.signing_key.sign(message);
        let bytes: [u8; 64] = sig.to_bytes().into();
        Secp256k1Signature(bytes)
    }
}

impl Drop for Secp256k1KeyPair {
    fn drop(&mut self) {
        let mut bytes: [u8; 32] = self.signing_key.to_bytes().into();
        bytes.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_verify_block_hash() {
        let keypair = Secp256k1KeyPair::generate();
        let block_hash = crate::blake3_hash(b"block content");

        let signature = keypair.sign(&block_hash);

        assert!(keypair.public_key().verify(&block_hash, &signature).is_ok());
    }

    #[test]
    fn test_wrong_message_fails() {
        let keypair = Secp256k1KeyPair::generate();
        let signature = keypair.sign(b"message1");

        let result = keypair.public_key().verify(b"message2", &signature);

        assert_eq!(result, Err(CryptoError::SignatureVerificationFailed));
    }

    #[test]
    fn test_deterministic_signatures() {
        let keypair = Secp256k1KeyPair::from_bytes([0xABu8; 32]).unwrap();

        let sig1 = keypair.sign(b"deterministic");
        let sig2 = keypair.sign(b"deterministic");

        assert_eq!(sig1.as_bytes(), sig2.as_bytes());
    }

    #[test]
    fn test_public_key_is_compressed() {
        let keypair = Secp256k1KeyPair::from_bytes([0x11u8; 32]).unwrap();
        let pk = keypair.public_key();

        assert!(matches!(pk.as_bytes()[0], 0x02 | 0x03));
        assert!(Secp256k1PublicKey::from_bytes(*pk.as_bytes()).is_ok());
        assert!(Secp256k1PublicKey::from_bytes([0u8; 33]).is_err());
    }

    #[test]
    fn test_signature_from_slice_checks_length() {
        assert_eq!(
            Secp256k1Signature::from_slice(&[0u8; 10]),
            Err(CryptoError::InvalidSignatureLength(10))
        );
        let sig = Secp256k1Signature::from_slice(&[1u8; 64]).unwrap();
        assert_eq!(hex::encode(sig.to_vec()), hex::encode([1u8; 64]));
    }
}
