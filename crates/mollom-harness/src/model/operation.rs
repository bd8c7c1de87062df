//! Operations for model-based testing.
//!
//! Operations script what the simulated network will do, move the clock, or
//! make a call. They are generated randomly by proptest and applied to both
//! the model and the real dispatcher.

use arbitrary::Arbitrary;
use mollom_core::TransportError;
use mollom_proto::{INTERNAL_ERROR, REFRESH_REQUIRED, SERVER_BUSY};

/// Server index. Reduced modulo [`SERVER_COUNT`].
pub type ServerId = u8;

/// Servers in the simulated pool.
pub const SERVER_COUNT: u8 = 3;

/// Bootstrap server the directory asks for lists.
pub const BOOTSTRAP: &str = "http://bootstrap.sim";

/// URL of a pool server.
pub fn server_url(id: ServerId) -> String {
    format!("http://s{}.sim", id % SERVER_COUNT)
}

/// What a server answers to one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Arbitrary)]
pub enum Reply {
    /// Success.
    Ok,
    /// Fault 1200.
    Busy,
    /// Fault 1100.
    RefreshRequired,
    /// Fault 1000.
    InternalError,
    /// No connection.
    Unreachable,
    /// HTTP 403.
    Rejected,
}

impl Reply {
    /// Transport result the real system sees. Successful calls answer with
    /// the server's own URL.
    pub fn to_result(self, server: &str) -> Result<String, TransportError> {
        match self {
            Self::Ok => Ok(server.to_string()),
            Self::Busy => Err(TransportError::fault(SERVER_BUSY, "busy")),
            Self::RefreshRequired => Err(TransportError::fault(REFRESH_REQUIRED, "refresh")),
            Self::InternalError => Err(TransportError::fault(INTERNAL_ERROR, "internal")),
            Self::Unreachable => {
                Err(TransportError::Network { reason: "connection refused".to_string() })
            },
            Self::Rejected => Err(TransportError::Protocol {
                status: 403,
                reason: "Forbidden".to_string(),
                headers: Vec::new(),
                body: String::new(),
            }),
        }
    }
}

/// Operations that can be applied to the system.
#[derive(Debug, Clone, Arbitrary)]
pub enum Operation {
    /// Queue one reply on a server.
    QueueReply {
        /// Server that will answer.
        server: ServerId,
        /// Its answer.
        reply: Reply,
    },

    /// Queue the next list the bootstrap returns. An empty list counts as a
    /// failed fetch.
    QueueList {
        /// Servers in priority order.
        servers: Vec<ServerId>,
    },

    /// Advance the clock.
    AdvanceTime {
        /// Hours to advance.
        hours: u8,
    },

    /// Make one call through the dispatcher.
    Invoke,
}

/// Observable result of an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelOutcome {
    /// Scripting and clock operations.
    Done,
    /// The call succeeded.
    Succeeded {
        /// Server that answered.
        server: String,
        /// Restarts taken.
        retries: u32,
    },
    /// Servers and restarts ran out.
    Exhausted {
        /// Transport attempts made.
        attempts: u32,
    },
    /// The call was rejected with an HTTP status.
    Rejected {
        /// Status code.
        status: u16,
    },
}
