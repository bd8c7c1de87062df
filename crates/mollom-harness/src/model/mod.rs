//! Reference model for model-based testing.
//!
//! The model restates the dispatcher, the directory cache and a scripted
//! network without locks, traits or logging. It serves as the oracle
//! against which the real implementation is verified.
//!
//! # Design Principles
//!
//! - Simplicity: The model should be obviously correct
//! - Deterministic: Same operations produce the same outcomes
//! - Hours, not instants: the clock only moves in whole hours

pub mod operation;
mod world;

pub use operation::{BOOTSTRAP, ModelOutcome, Operation, Reply, SERVER_COUNT, ServerId, server_url};
pub use world::{ModelWorld, ObservableState};
