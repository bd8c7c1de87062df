//! Deterministic simulation harness for the Mollom client.
//!
//! Seeded implementations of the Environment and Transport traits, so
//! failover, refresh and expiry scenarios replay exactly.
//!
//! # Model-Based Testing
//!
//! The `model` module provides a reference dispatcher. Random operation
//! sequences (scripted replies, server lists, clock moves and calls) are
//! applied to both the model and the real dispatcher, and their observable
//! outcomes are compared.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod model;
pub mod scripted;
pub mod sim_env;

pub use model::{
    BOOTSTRAP, ModelOutcome, ModelWorld, ObservableState, Operation, Reply, SERVER_COUNT,
    ServerId, server_url,
};
pub use scripted::{Contact, ScriptedTransport};
pub use sim_env::SimEnv;
