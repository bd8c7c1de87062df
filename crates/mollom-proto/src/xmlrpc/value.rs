//! XML-RPC value model.

use std::collections::BTreeMap;

use crate::error::CodecError;

/// A dynamically typed XML-RPC value.
///
/// Structs use a `BTreeMap` so encoded members come out in a stable order.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// `<int>`, `<i4>` or `<i8>`.
    Int(i64),
    /// `<boolean>`.
    Bool(bool),
    /// `<string>` or an untyped `<value>`.
    String(String),
    /// `<double>`.
    Double(f64),
    /// `<dateTime.iso8601>`, kept as its raw text.
    DateTime(String),
    /// `<base64>`.
    Base64(Vec<u8>),
    /// `<struct>`.
    Struct(BTreeMap<String, Value>),
    /// `<array>`.
    Array(Vec<Value>),
    /// `<nil/>` extension.
    Nil,
}

impl Value {
    /// Borrow a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) | Self::DateTime(s) => Some(s),
            _ => None,
        }
    }

    /// Integer value. Whole-number strings are accepted as well.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            Self::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Floating point value. Integers widen.
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Double(d) => Some(*d),
            Self::Int(i) => Some(*i as f64),
            Self::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Boolean value. Mollom sometimes answers `1`/`0` instead of
    /// `<boolean>`, so integers are accepted.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Int(0) => Some(false),
            Self::Int(1) => Some(true),
            _ => None,
        }
    }

    /// Borrow array elements.
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Borrow struct members.
    pub fn as_struct(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Self::Struct(members) => Some(members),
            _ => None,
        }
    }

    /// Look up a struct member.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_struct().and_then(|m| m.get(key))
    }

    /// Look up a required struct member.
    pub fn member(&self, key: &str) -> Result<&Value, CodecError> {
        self.get(key).ok_or_else(|| CodecError::missing(key))
    }

    /// Required string member.
    pub fn str_member(&self, key: &str) -> Result<&str, CodecError> {
        self.member(key)?.as_str().ok_or_else(|| CodecError::unexpected(key, "string"))
    }

    /// Required integer member.
    pub fn int_member(&self, key: &str) -> Result<i64, CodecError> {
        self.member(key)?.as_i64().ok_or_else(|| CodecError::unexpected(key, "int"))
    }

    /// Required floating point member.
    pub fn f64_member(&self, key: &str) -> Result<f64, CodecError> {
        self.member(key)?.as_f64().ok_or_else(|| CodecError::unexpected(key, "double"))
    }

    /// Render as a flat form value. Used by the REST transport, which has no
    /// nested values.
    pub fn to_form_string(&self) -> String {
        match self {
            Self::Int(i) => i.to_string(),
            Self::Bool(b) => String::from(if *b { "1" } else { "0" }),
            Self::String(s) | Self::DateTime(s) => s.clone(),
            Self::Double(d) => d.to_string(),
            Self::Base64(bytes) => {
                use base64::{Engine as _, engine::general_purpose::STANDARD};
                STANDARD.encode(bytes)
            },
            Self::Nil => String::new(),
            Self::Struct(_) | Self::Array(_) => String::new(),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Self::String(s.clone())
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Self {
        Self::Double(d)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::Array(items.into_iter().map(Into::into).collect())
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(members: BTreeMap<String, Value>) -> Self {
        Self::Struct(members)
    }
}
