//! # Genesis Module
//!
//! Genesis block creation.
//!
//! The genesis block is the root of the DAG:
//!
//! - No parents and no justifications
//! - Sender: `ValidatorId::GENESIS`, sequence number 0
//! - Bonds: the initial validator set
//! - Post-state: a digest of the initial bonds
//!
//! Every node of a network must build it from the same configuration, so
//! nothing in it depends on the local clock.

pub mod builder;

pub use builder::{GenesisBuilder, GenesisConfig, GenesisError};
