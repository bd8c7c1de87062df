//! Remote fault codes.
//!
//! Mollom reports service-level trouble inside an otherwise well-formed
//! response. XML-RPC carries it in a `<fault>` struct; REST carries it in the
//! JSON error body. Both map onto [`FaultKind`].

/// The server hit an internal error. Another server may succeed.
pub const INTERNAL_ERROR: i32 = 1000;

/// The client's server list is out of date and must be refreshed.
pub const REFRESH_REQUIRED: i32 = 1100;

/// The server is too busy. Try the next server.
pub const SERVER_BUSY: i32 = 1200;

/// Classification of a remote fault code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultKind {
    /// Code 1000.
    InternalError,
    /// Code 1100.
    RefreshRequired,
    /// Code 1200.
    ServerBusy,
    /// Any code the protocol does not define.
    Other,
}

impl FaultKind {
    /// Classify a raw fault code.
    pub fn from_code(code: i32) -> Self {
        match code {
            INTERNAL_ERROR => Self::InternalError,
            REFRESH_REQUIRED => Self::RefreshRequired,
            SERVER_BUSY => Self::ServerBusy,
            _ => Self::Other,
        }
    }

    /// Returns true if this code is one Mollom defines.
    pub fn is_known(self) -> bool {
        !matches!(self, Self::Other)
    }
}
