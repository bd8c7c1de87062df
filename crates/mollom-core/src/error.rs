//! Error taxonomy.
//!
//! Every call resolves to a value or a [`MollomError`]. HTTP statuses are
//! classified per resource: a 404 while solving a CAPTCHA means the CAPTCHA
//! does not exist, a 404 on a site means the site is unknown.

use std::fmt;

use thiserror::Error;

use crate::transport::TransportError;

/// What a call was operating on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    /// Any call before a resource is known, including directory fetches.
    Connection,
    /// Content checks.
    Content,
    /// CAPTCHA creation and solving.
    Captcha,
    /// Feedback on earlier checks.
    Feedback,
    /// Site registration.
    Site,
    /// Blacklist entries.
    Blacklist,
    /// Whitelist entries.
    Whitelist,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Connection => "connection",
            Self::Content => "content",
            Self::Captcha => "captcha",
            Self::Feedback => "feedback",
            Self::Site => "site",
            Self::Blacklist => "blacklist",
            Self::Whitelist => "whitelist",
        };
        f.write_str(name)
    }
}

/// Why a resource call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorReason {
    /// 401: bad or missing authentication.
    Unauthorised,
    /// 403: authenticated but not allowed.
    Forbidden,
    /// 404 on a resource with no more specific meaning.
    NotFound,
    /// CAPTCHA 404.
    DoesNotExist,
    /// CAPTCHA 409: already solved.
    AlreadyProcessed,
    /// CAPTCHA 410.
    Expired,
    /// Feedback without a content or CAPTCHA id.
    MissingId,
    /// Feedback 400: reason not accepted.
    UnknownReason,
    /// Site 404.
    UnknownSite,
    /// Blacklist or whitelist 404.
    UnknownEntry,
    /// Anything else.
    Service,
}

impl ErrorReason {
    /// Classify an HTTP status for a resource.
    pub fn classify(resource: Resource, status: u16) -> Self {
        match (resource, status) {
            (_, 401) => Self::Unauthorised,
            (_, 403) => Self::Forbidden,
            (Resource::Captcha, 404) => Self::DoesNotExist,
            (Resource::Captcha, 409) => Self::AlreadyProcessed,
            (Resource::Captcha, 410) => Self::Expired,
            (Resource::Feedback, 400) => Self::UnknownReason,
            (Resource::Site, 404) => Self::UnknownSite,
            (Resource::Blacklist | Resource::Whitelist, 404) => Self::UnknownEntry,
            (_, 404) => Self::NotFound,
            _ => Self::Service,
        }
    }
}

impl fmt::Display for ErrorReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Unauthorised => "unauthorised",
            Self::Forbidden => "forbidden",
            Self::NotFound => "not found",
            Self::DoesNotExist => "does not exist",
            Self::AlreadyProcessed => "already processed",
            Self::Expired => "expired",
            Self::MissingId => "missing id",
            Self::UnknownReason => "unknown reason",
            Self::UnknownSite => "unknown site",
            Self::UnknownEntry => "unknown entry",
            Self::Service => "service error",
        };
        f.write_str(text)
    }
}

/// Errors from Mollom calls.
#[derive(Debug, Clone, Error)]
pub enum MollomError {
    /// No HTTP response was received.
    #[error("network error: {reason}")]
    Network {
        /// Description of the failure.
        reason: String,
    },

    /// The service answered with an error status.
    #[error("{resource}: {reason} (HTTP {status}): {message}")]
    Status {
        /// Resource the call operated on.
        resource: Resource,
        /// Classified reason.
        reason: ErrorReason,
        /// HTTP status, or 400 for errors detected before sending.
        status: u16,
        /// Reason phrase or server message.
        message: String,
    },

    /// The service answered with something that could not be decoded.
    #[error("malformed response: {reason}")]
    MalformedResponse {
        /// Description of the decoding failure.
        reason: String,
    },

    /// Retries and servers ran out.
    #[error(
        "no server could handle the request after {attempts} attempt(s){}",
        last_failure_suffix(.last_failure.as_deref())
    )]
    Exhausted {
        /// Transport attempts made.
        attempts: u32,
        /// The last failure seen, if any attempt was made.
        last_failure: Option<String>,
    },

    /// Client configuration is invalid.
    #[error("configuration error: {reason}")]
    Config {
        /// What is wrong.
        reason: String,
    },
}

fn last_failure_suffix(last: Option<&str>) -> String {
    last.map(|l| format!(", last failure: {l}")).unwrap_or_default()
}

impl MollomError {
    /// Error for a call rejected before anything was sent.
    pub fn rejected(resource: Resource, reason: ErrorReason, message: impl Into<String>) -> Self {
        Self::Status { resource, reason, status: 400, message: message.into() }
    }

    /// Numeric code: the HTTP status for status errors, 502 for undecodable
    /// responses, 503 when no server could be reached, 500 for configuration
    /// errors.
    pub fn code(&self) -> u16 {
        match self {
            Self::Status { status, .. } => *status,
            Self::MalformedResponse { .. } => 502,
            Self::Network { .. } | Self::Exhausted { .. } => 503,
            Self::Config { .. } => 500,
        }
    }

    /// Reason, for status errors.
    pub fn reason(&self) -> Option<ErrorReason> {
        match self {
            Self::Status { reason, .. } => Some(*reason),
            _ => None,
        }
    }

    /// Re-tag a status error with the resource the call was about, so the
    /// status maps to that resource's reasons. Other errors pass through.
    #[must_use]
    pub fn in_resource(self, resource: Resource) -> Self {
        match self {
            Self::Status { reason: ErrorReason::MissingId, .. } => self,
            Self::Status { status, message, .. } => Self::Status {
                resource,
                reason: ErrorReason::classify(resource, status),
                status,
                message,
            },
            other => other,
        }
    }

    /// Returns true if retrying the same call later cannot succeed.
    ///
    /// Client errors (4xx), undecodable responses and configuration errors
    /// are fatal. Network trouble, exhaustion and server errors are
    /// transient.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Status { status, .. } => *status < 500,
            Self::MalformedResponse { .. } | Self::Config { .. } => true,
            Self::Network { .. } | Self::Exhausted { .. } => false,
        }
    }
}

impl From<TransportError> for MollomError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Protocol { status, reason, body, .. } => {
                let message = if body.trim().is_empty() { reason } else { body };
                Self::Status {
                    resource: Resource::Connection,
                    reason: ErrorReason::classify(Resource::Connection, status),
                    status,
                    message,
                }
            },
            TransportError::Decode { reason } => Self::MalformedResponse { reason },
            TransportError::Network { reason } => Self::Network { reason },
            TransportError::Fault(fault) => Self::Exhausted {
                attempts: 1,
                last_failure: Some(format!("fault {}: {}", fault.code, fault.message)),
            },
        }
    }
}

impl From<mollom_proto::CodecError> for MollomError {
    fn from(err: mollom_proto::CodecError) -> Self {
        Self::MalformedResponse { reason: err.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn protocol(status: u16) -> TransportError {
        TransportError::Protocol {
            status,
            reason: "Reason".to_string(),
            headers: Vec::new(),
            body: String::new(),
        }
    }

    #[test]
    fn captcha_statuses_are_specific() {
        assert_eq!(ErrorReason::classify(Resource::Captcha, 404), ErrorReason::DoesNotExist);
        assert_eq!(ErrorReason::classify(Resource::Captcha, 409), ErrorReason::AlreadyProcessed);
        assert_eq!(ErrorReason::classify(Resource::Captcha, 410), ErrorReason::Expired);
    }

    #[test]
    fn generic_statuses() {
        assert_eq!(ErrorReason::classify(Resource::Content, 401), ErrorReason::Unauthorised);
        assert_eq!(ErrorReason::classify(Resource::Site, 403), ErrorReason::Forbidden);
        assert_eq!(ErrorReason::classify(Resource::Content, 404), ErrorReason::NotFound);
        assert_eq!(ErrorReason::classify(Resource::Content, 409), ErrorReason::Service);
        assert_eq!(ErrorReason::classify(Resource::Whitelist, 404), ErrorReason::UnknownEntry);
    }

    #[test]
    fn retagging_reclassifies_status() {
        let err = MollomError::from(protocol(404)).in_resource(Resource::Captcha);
        assert_eq!(err.reason(), Some(ErrorReason::DoesNotExist));
        assert_eq!(err.code(), 404);
    }

    #[test]
    fn retagging_keeps_local_rejections() {
        let err = MollomError::rejected(Resource::Feedback, ErrorReason::MissingId, "no id")
            .in_resource(Resource::Feedback);
        assert_eq!(err.reason(), Some(ErrorReason::MissingId));
    }

    #[test]
    fn codes_for_non_status_errors() {
        assert_eq!(MollomError::MalformedResponse { reason: String::new() }.code(), 502);
        assert_eq!(MollomError::Network { reason: String::new() }.code(), 503);
        assert_eq!(MollomError::Exhausted { attempts: 3, last_failure: None }.code(), 503);
        assert_eq!(MollomError::Config { reason: String::new() }.code(), 500);
    }

    #[test]
    fn server_errors_are_transient() {
        assert!(!MollomError::from(protocol(503)).is_fatal());
        assert!(MollomError::from(protocol(401)).is_fatal());
        assert!(!MollomError::Network { reason: "timeout".to_string() }.is_fatal());
    }

    #[test]
    fn body_preferred_over_reason_phrase() {
        let err = MollomError::from(TransportError::Protocol {
            status: 400,
            reason: "Bad Request".to_string(),
            headers: Vec::new(),
            body: "invalid reason".to_string(),
        });
        assert!(err.to_string().ends_with("invalid reason"));
    }

    #[test]
    fn exhausted_display() {
        let err = MollomError::Exhausted {
            attempts: 2,
            last_failure: Some("fault 1200: busy".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "no server could handle the request after 2 attempt(s), last failure: fault 1200: busy"
        );
    }
}
