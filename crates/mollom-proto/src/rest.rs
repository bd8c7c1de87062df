//! REST response helpers.
//!
//! Every REST response wraps its payload in a named member (`content`,
//! `captcha`, `entry`, `site`), and listings share a paging envelope.
//! Numbers sometimes arrive as JSON strings, so numeric fields decode
//! leniently.

use serde::{Deserialize, Deserializer, de::DeserializeOwned};
use serde_json::Value as Json;

use crate::{error::CodecError, fault::FaultKind};

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListPage<T> {
    /// Decoded items.
    pub items: Vec<T>,
    /// `listCount`: number of items on this page.
    pub count: u64,
    /// `listOffset`: offset of the first item.
    pub offset: u64,
    /// `listTotal`: items across all pages.
    pub total: u64,
}

impl<T> ListPage<T> {
    /// Returns true if more items exist past this page.
    pub fn has_more(&self) -> bool {
        self.offset.saturating_add(self.count) < self.total
    }
}

/// Parse a response body.
pub fn parse(body: &str) -> Result<Json, CodecError> {
    Ok(serde_json::from_str(body)?)
}

/// Borrow the named member of a response document.
pub fn extract<'a>(doc: &'a Json, key: &str) -> Result<&'a Json, CodecError> {
    doc.get(key).ok_or_else(|| CodecError::missing(key))
}

/// Decode the named member of a response document.
pub fn decode<T: DeserializeOwned>(doc: &Json, key: &str) -> Result<T, CodecError> {
    Ok(T::deserialize(extract(doc, key)?)?)
}

/// Decode a paged listing.
pub fn decode_list<T: DeserializeOwned>(doc: &Json) -> Result<ListPage<T>, CodecError> {
    let items = extract(doc, "list")?
        .as_array()
        .ok_or_else(|| CodecError::unexpected("list", "array"))?
        .iter()
        .map(T::deserialize)
        .collect::<Result<Vec<_>, _>>()?;

    let count = match doc.get("listCount") {
        Some(v) => number(v, "listCount")?,
        None => u64::try_from(items.len()).unwrap_or(u64::MAX),
    };

    Ok(ListPage {
        items,
        count,
        offset: doc.get("listOffset").map_or(Ok(0), |v| number(v, "listOffset"))?,
        total: doc.get("listTotal").map_or(Ok(count), |v| number(v, "listTotal"))?,
    })
}

/// Fault code carried in an error body, if the body is one.
///
/// Mollom reports service faults as `{"code": 1200, "message": "..."}`. Only
/// codes the protocol defines count; anything else is a plain HTTP error.
pub fn fault_in_body(body: &str) -> Option<(i32, String)> {
    let doc: Json = serde_json::from_str(body).ok()?;
    let code = doc.get("code").and_then(as_u64)?;
    let code = i32::try_from(code).ok()?;
    if !FaultKind::from_code(code).is_known() {
        return None;
    }
    let message = doc.get("message").and_then(Json::as_str).unwrap_or_default();
    Some((code, message.to_string()))
}

fn number(value: &Json, field: &str) -> Result<u64, CodecError> {
    as_u64(value).ok_or_else(|| CodecError::unexpected(field, "unsigned integer"))
}

fn as_u64(value: &Json) -> Option<u64> {
    match value {
        Json::Number(n) => n.as_u64(),
        Json::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Deserialize an optional `u64` that may arrive as a number or a numeric
/// string. `null` and absent both decode to `None`.
pub fn lenient_opt_u64<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<u64>, D::Error> {
    let value = Option::<Json>::deserialize(deserializer)?;
    match value {
        None | Some(Json::Null) => Ok(None),
        Some(v) => as_u64(&v)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("expected integer, got {v}"))),
    }
}

/// Deserialize an optional flag sent as `true`/`false`, `0`/`1` or a string
/// of either.
pub fn lenient_opt_bool<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<bool>, D::Error> {
    let value = Option::<Json>::deserialize(deserializer)?;
    match value {
        None | Some(Json::Null) => Ok(None),
        Some(Json::Bool(b)) => Ok(Some(b)),
        Some(v) => match as_u64(&v) {
            Some(0) => Ok(Some(false)),
            Some(1) => Ok(Some(true)),
            _ => match v.as_str().map(str::trim) {
                Some("true") => Ok(Some(true)),
                Some("false") => Ok(Some(false)),
                _ => Err(serde::de::Error::custom(format!("expected flag, got {v}"))),
            },
        },
    }
}
