//! XML-RPC encoding for the legacy Mollom protocol.
//!
//! Calls are `mollom.<name>` with a single struct argument; responses carry a
//! single value or a fault.

mod codec;
mod value;

pub use codec::{
    MAX_DEPTH, MethodResponse, decode_call, decode_response, encode_call, encode_response,
};
pub use value::Value;

/// Namespace prefix for every Mollom method.
pub const METHOD_PREFIX: &str = "mollom.";

/// Fully qualified method name for a call.
pub fn method_name(call: &str) -> String {
    format!("{METHOD_PREFIX}{call}")
}
