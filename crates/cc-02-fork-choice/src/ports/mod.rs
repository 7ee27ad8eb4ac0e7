//! Ports for the Fork Choice subsystem.

pub mod inbound;

pub use inbound::*;
