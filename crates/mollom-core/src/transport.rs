//! Transport abstraction.
//!
//! A transport performs exactly one request against one server and reports
//! what happened. Retry, failover and refresh all live in the dispatcher, so
//! transports never loop.

use mollom_proto::{CodecError, FaultKind, RequestEnvelope};
use thiserror::Error;

use crate::auth::AuthStamp;

/// A remote-reported fault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fault {
    /// Raw fault code.
    pub code: i32,
    /// Server-supplied message.
    pub message: String,
}

impl Fault {
    /// Classification of the code.
    pub fn kind(&self) -> FaultKind {
        FaultKind::from_code(self.code)
    }
}

/// Outcome of a failed round trip.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The server answered with a fault.
    #[error("fault {}: {}", .0.code, .0.message)]
    Fault(Fault),

    /// HTTP-level failure. The response was not decoded.
    #[error("HTTP {status} {reason}")]
    Protocol {
        /// HTTP status.
        status: u16,
        /// Reason phrase.
        reason: String,
        /// Response headers.
        headers: Vec<(String, String)>,
        /// Response body, possibly empty.
        body: String,
    },

    /// No HTTP response: connection refused, DNS failure, timeout.
    #[error("network error: {reason}")]
    Network {
        /// Description of the failure.
        reason: String,
    },

    /// A 2xx response whose body could not be decoded.
    #[error("undecodable response: {reason}")]
    Decode {
        /// Description of the decoding failure.
        reason: String,
    },
}

impl TransportError {
    /// Shorthand for a fault.
    pub fn fault(code: i32, message: impl Into<String>) -> Self {
        Self::Fault(Fault { code, message: message.into() })
    }
}

impl From<CodecError> for TransportError {
    fn from(err: CodecError) -> Self {
        Self::Decode { reason: err.to_string() }
    }
}

/// One request, one server.
///
/// Implementations must be blocking with a bounded timeout, and must not
/// retry internally.
pub trait Transport: Send + Sync {
    /// Decoded success payload.
    type Output;

    /// Send `envelope` to `server`, signed with `stamp` if the envelope asks
    /// for it.
    fn round_trip(
        &self,
        server: &str,
        envelope: &RequestEnvelope,
        stamp: &AuthStamp,
    ) -> Result<Self::Output, TransportError>;

    /// Ask `bootstrap` for the current server list.
    fn fetch_servers(
        &self,
        bootstrap: &str,
        stamp: &AuthStamp,
    ) -> Result<Vec<String>, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fault_kind_follows_code() {
        assert_eq!(Fault { code: 1200, message: String::new() }.kind(), FaultKind::ServerBusy);
        assert_eq!(Fault { code: 7, message: String::new() }.kind(), FaultKind::Other);
    }

    #[test]
    fn codec_errors_become_decode_errors() {
        let err: TransportError = CodecError::missing("spam").into();
        assert!(matches!(err, TransportError::Decode { reason } if reason.contains("spam")));
    }

    #[test]
    fn display_includes_status() {
        let err = TransportError::Protocol {
            status: 503,
            reason: "Service Unavailable".to_string(),
            headers: Vec::new(),
            body: String::new(),
        };
        assert_eq!(err.to_string(), "HTTP 503 Service Unavailable");
    }
}
