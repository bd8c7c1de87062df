//! Codec error types.

use thiserror::Error;

/// Errors from encoding or decoding wire payloads.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The XML document is not well formed.
    #[error("invalid XML: {0}")]
    Xml(#[from] quick_xml::Error),

    /// The document is well formed but not a valid XML-RPC response.
    #[error("invalid XML-RPC response: {reason}")]
    InvalidResponse {
        /// What was wrong with the document.
        reason: String,
    },

    /// A scalar could not be parsed as its declared type.
    #[error("invalid <{kind}> value: {raw:?}")]
    InvalidScalar {
        /// XML-RPC type tag.
        kind: &'static str,
        /// Raw text that failed to parse.
        raw: String,
    },

    /// JSON could not be parsed.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A named member the protocol requires is absent.
    #[error("missing field `{field}`")]
    MissingField {
        /// Name of the absent field.
        field: String,
    },

    /// A field was present with the wrong type.
    #[error("field `{field}` has unexpected type, expected {expected}")]
    UnexpectedType {
        /// Name of the field.
        field: String,
        /// Human-readable expected type.
        expected: &'static str,
    },
}

impl CodecError {
    /// Shorthand for [`CodecError::MissingField`].
    pub fn missing(field: impl Into<String>) -> Self {
        Self::MissingField { field: field.into() }
    }

    /// Shorthand for [`CodecError::UnexpectedType`].
    pub fn unexpected(field: impl Into<String>, expected: &'static str) -> Self {
        Self::UnexpectedType { field: field.into(), expected }
    }
}
