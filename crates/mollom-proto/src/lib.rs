//! Mollom Wire Formats
//!
//! Encoding and decoding for the two Mollom transports. Nothing in this crate
//! performs I/O; transports in `mollom-client` feed bytes in and out.
//!
//! # Components
//!
//! - [`Value`]: XML-RPC value model, also used as the argument type for REST
//!   calls so both transports share one [`Params`] map
//! - [`xmlrpc`]: `methodCall` encoder and `methodResponse` decoder
//! - [`rest`]: JSON envelope extraction and paginated listings
//! - [`RequestEnvelope`]: one logical remote call, independent of transport
//! - [`FaultKind`]: shared vocabulary for remote-reported faults

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod envelope;
pub mod error;
pub mod fault;
pub mod params;
pub mod rest;
pub mod xmlrpc;

pub use envelope::{Method, RequestEnvelope};
pub use error::CodecError;
pub use fault::{FaultKind, INTERNAL_ERROR, REFRESH_REQUIRED, SERVER_BUSY};
pub use params::Params;
pub use rest::ListPage;
pub use xmlrpc::{MethodResponse, Value};
