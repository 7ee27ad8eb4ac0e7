//! # Node Runtime Library
//!
//! Wiring for a Casper-Core node. The `node-runtime` binary is a thin shell
//! around [`NodeRuntime`]; the modules are public so integration tests can
//! drive a node without a network.
//!
//! - `container/` - configuration and subsystem construction
//! - `genesis/` - genesis block creation
//! - `admission` - serialized block admission with a pending buffer
//! - `proposer` - block production for the local validator
//! - `runtime` - task spawning and graceful shutdown

pub mod admission;
pub mod container;
pub mod genesis;
pub mod proposer;
pub mod runtime;

pub use admission::{
    AdmissionConfig, AdmissionError, AdmissionHandle, AdmissionQueue, BlockRequester,
    LoggingRequester,
};
pub use container::{ConfigError, ContainerError, NodeConfig, NodeContainer, ProposerConfig};
pub use genesis::{GenesisBuilder, GenesisConfig, GenesisError};
pub use proposer::{BlockProposer, ProposeError};
pub use runtime::NodeRuntime;
