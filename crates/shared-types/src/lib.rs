//! # Shared Types Crate
//!
//! Domain entities shared by every consensus subsystem: blocks, deploys,
//! validator identities and bonds.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All cross-subsystem types are defined here.
//! - **Content Addressing**: A block is identified by the hash of
//!   [`Block::content_bytes`]; the signature covers that hash.
//! - **Deterministic Encoding**: Maps are `BTreeMap`s so iteration order, and
//!   therefore the encoding, is canonical.

pub mod entities;
pub mod errors;

pub use entities::*;
pub use errors::*;
