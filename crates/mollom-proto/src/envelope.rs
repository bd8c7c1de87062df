//! Transport-independent request description.

use crate::params::Params;

/// HTTP method. Only meaningful for REST; XML-RPC always POSTs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// Read.
    Get,
    /// Create, update or action.
    Post,
}

impl Method {
    /// Wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

/// One logical remote call.
///
/// Authentication fields are not part of the envelope. The dispatcher stamps
/// each attempt afresh, so the same envelope can be replayed against several
/// servers.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestEnvelope {
    /// XML-RPC method suffix (`checkContent`) or REST resource path
    /// (`content/abc`).
    pub call: String,
    /// HTTP method for REST.
    pub method: Method,
    /// Call arguments.
    pub params: Params,
    /// Whether the request carries authentication.
    pub signed: bool,
}

impl RequestEnvelope {
    /// Signed XML-RPC call.
    pub fn rpc(call: &str, params: Params) -> Self {
        Self { call: call.to_string(), method: Method::Post, params, signed: true }
    }

    /// Signed REST read.
    pub fn get(path: impl Into<String>, params: Params) -> Self {
        Self { call: path.into(), method: Method::Get, params, signed: true }
    }

    /// Signed REST write.
    pub fn post(path: impl Into<String>, params: Params) -> Self {
        Self { call: path.into(), method: Method::Post, params, signed: true }
    }

    /// Drop authentication. Used for site registration, which happens before
    /// the caller has keys.
    #[must_use]
    pub fn unsigned(mut self) -> Self {
        self.signed = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rpc_calls_are_signed_posts() {
        let env = RequestEnvelope::rpc("verifyKey", Params::new());
        assert_eq!(env.method, Method::Post);
        assert!(env.signed);
    }

    #[test]
    fn unsigned_clears_flag() {
        let env = RequestEnvelope::post("site", Params::new()).unsigned();
        assert!(!env.signed);
        assert_eq!(env.method.as_str(), "POST");
    }
}
