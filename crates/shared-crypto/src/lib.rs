//! # Shared Crypto - Consensus Cryptographic Primitives
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `hashing` | BLAKE3 | Block content hashes, state identifiers |
//! | `ecdsa` | secp256k1 | Validator identity and block signatures |
//!
//! ## Security Properties
//!
//! - **secp256k1**: RFC 6979 deterministic nonces, low-S normalization
//! - **BLAKE3**: domain-separated contexts for derived hashes

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ecdsa;
pub mod errors;
pub mod hashing;

// Re-exports
pub use ecdsa::{Secp256k1KeyPair, Secp256k1PublicKey, Secp256k1Signature};
pub use errors::CryptoError;
pub use hashing::{blake3_hash, blake3_hash_many, Blake3Hasher, Hash};
