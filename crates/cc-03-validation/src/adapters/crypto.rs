//! secp256k1 signatures over BLAKE3 content hashes.

use shared_crypto::{blake3_hash, Secp256k1PublicKey, Secp256k1Signature};
use shared_types::{Hash, ValidatorId};
use tracing::trace;

use crate::ports::CryptoProvider;

/// Production [`CryptoProvider`]: a validator id is its compressed secp256k1
/// public key, a block hash is the BLAKE3 hash of its content bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct Secp256k1Blake3Provider;

impl CryptoProvider for Secp256k1Blake3Provider {
    fn hash(&self, data: &[u8]) -> Hash {
        blake3_hash(data)
    }

    fn verify(&self, signer: &ValidatorId, message: &[u8], signature: &[u8]) -> bool {
        let Ok(public_key) = Secp256k1PublicKey::from_bytes(signer.0) else {
            trace!(validator = %signer, "Validator id is not a valid public key");
            return false;
        };
        let Ok(signature) = Secp256k1Signature::from_slice(signature) else {
            return false;
        };
        public_key.verify(message, &signature).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_crypto::Secp256k1KeyPair;

    fn signer() -> (Secp256k1KeyPair, ValidatorId) {
        let keypair = Secp256k1KeyPair::from_bytes([7u8; 32]).unwrap();
        let id = ValidatorId(*keypair.public_key().as_bytes());
        (keypair, id)
    }

    #[test]
    fn test_valid_signature_verifies() {
        let (keypair, id) = signer();
        let provider = Secp256k1Blake3Provider;
        let message = provider.hash(b"block content");
        let signature = keypair.sign(&message);

        assert!(provider.verify(&id, &message, signature.as_bytes()));
    }

    #[test]
    fn test_wrong_signer_fails() {
        let (keypair, _) = signer();
        let other = Secp256k1KeyPair::from_bytes([8u8; 32]).unwrap();
        let other_id = ValidatorId(*other.public_key().as_bytes());
        let signature = keypair.sign(b"message");

        assert!(!Secp256k1Blake3Provider.verify(&other_id, b"message", signature.as_bytes()));
    }

    #[test]
    fn test_garbage_inputs_fail_closed() {
        let (keypair, id) = signer();
        let signature = keypair.sign(b"message");

        assert!(!Secp256k1Blake3Provider.verify(&ValidatorId([0u8; 33]), b"message", signature.as_bytes()));
        assert!(!Secp256k1Blake3Provider.verify(&id, b"message", &[1u8; 10]));
        assert!(!Secp256k1Blake3Provider.verify(&id, b"tampered", signature.as_bytes()));
    }
}
