//! Per-site whitelist.

use mollom_core::{DirectoryCache, Environment, MollomError, Resource, Transport};
use mollom_proto::{ListPage, Params, RequestEnvelope, rest};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use super::{MollomRest, page, path};

/// Author attribute a whitelist entry matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WhitelistContext {
    /// Author IP.
    AuthorIp,
    /// Author id.
    AuthorId,
    /// Author name.
    AuthorName,
    /// Author email.
    AuthorMail,
}

impl WhitelistContext {
    /// Wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AuthorIp => "authorIp",
            Self::AuthorId => "authorId",
            Self::AuthorName => "authorName",
            Self::AuthorMail => "authorMail",
        }
    }
}

/// Fields of a whitelist entry to create or update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhitelistEntryRequest {
    /// Trusted value.
    pub value: String,
    /// Attribute it is compared with.
    pub context: WhitelistContext,
    /// Whether the entry is active.
    pub enabled: bool,
    /// Free-form note.
    pub note: Option<String>,
}

impl WhitelistEntryRequest {
    /// Active entry trusting `value` as `context`.
    pub fn new(value: impl Into<String>, context: WhitelistContext) -> Self {
        Self { value: value.into(), context, enabled: true, note: None }
    }

    fn to_params(&self) -> Params {
        Params::new()
            .with("value", self.value.as_str())
            .with("context", self.context.as_str())
            .with("status", self.enabled)
            .with_opt("note", self.note.as_ref())
    }
}

/// The `entry` member of a whitelist response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhitelistEntry {
    /// Entry id.
    pub id: String,
    /// Creation time, seconds since the epoch.
    #[serde(default, deserialize_with = "rest::lenient_opt_u64")]
    pub created: Option<u64>,
    /// Whether the entry is active.
    #[serde(default, deserialize_with = "rest::lenient_opt_bool")]
    pub status: Option<bool>,
    /// Last time the entry matched.
    #[serde(default, deserialize_with = "rest::lenient_opt_u64")]
    pub last_match: Option<u64>,
    /// How often the entry matched.
    #[serde(default, deserialize_with = "rest::lenient_opt_u64")]
    pub match_count: Option<u64>,
    /// Trusted value.
    pub value: String,
    /// Attribute it is compared with.
    #[serde(default)]
    pub context: Option<WhitelistContext>,
    /// Free-form note.
    #[serde(default)]
    pub note: Option<String>,
}

impl<E, T, C> MollomRest<E, T, C>
where
    E: Environment,
    T: Transport<Output = Json>,
    C: DirectoryCache,
{
    fn whitelist_path(&self, id: Option<&str>) -> String {
        match id {
            Some(id) => path(&["whitelist", self.public_key(), id]),
            None => path(&["whitelist", self.public_key()]),
        }
    }

    /// Add an entry.
    pub fn create_whitelist_entry(
        &self,
        request: &WhitelistEntryRequest,
    ) -> Result<WhitelistEntry, MollomError> {
        let envelope = RequestEnvelope::post(self.whitelist_path(None), request.to_params());
        self.fetch(Resource::Whitelist, &envelope, "entry")
    }

    /// Replace an entry's fields.
    pub fn update_whitelist_entry(
        &self,
        id: &str,
        request: &WhitelistEntryRequest,
    ) -> Result<WhitelistEntry, MollomError> {
        let envelope = RequestEnvelope::post(self.whitelist_path(Some(id)), request.to_params());
        self.fetch(Resource::Whitelist, &envelope, "entry")
    }

    /// Remove an entry.
    pub fn delete_whitelist_entry(&self, id: &str) -> Result<(), MollomError> {
        let path = format!("{}/delete", self.whitelist_path(Some(id)));
        self.send(Resource::Whitelist, &RequestEnvelope::post(path, Params::new()))?;
        Ok(())
    }

    /// Read one entry. A 404 maps to *unknown entry*.
    pub fn read_whitelist_entry(&self, id: &str) -> Result<WhitelistEntry, MollomError> {
        let envelope = RequestEnvelope::get(self.whitelist_path(Some(id)), Params::new());
        self.fetch(Resource::Whitelist, &envelope, "entry")
    }

    /// One page of entries.
    pub fn list_whitelist(
        &self,
        offset: u64,
        count: Option<u64>,
    ) -> Result<ListPage<WhitelistEntry>, MollomError> {
        let envelope = RequestEnvelope::get(self.whitelist_path(None), page(offset, count));
        self.fetch_list(Resource::Whitelist, &envelope)
    }
}

#[cfg(test)]
mod tests {
    use mollom_core::{ErrorReason, TransportError};
    use serde_json::json;

    use super::*;
    use crate::rest::testing::{client, pairs};

    #[test]
    fn create_sends_context_and_status() {
        let (client, recorder) = client();
        let entry = json!({"id": "w1", "value": "10.0.0.1", "context": "authorIp"});
        recorder.reply(Ok(json!({ "entry": entry })));

        let mut request = WhitelistEntryRequest::new("10.0.0.1", WhitelistContext::AuthorIp);
        request.note = Some("office".to_string());
        let entry = client.create_whitelist_entry(&request).unwrap();

        assert_eq!(entry.context, Some(WhitelistContext::AuthorIp));
        let sent = recorder.last();
        assert_eq!(sent.call, "whitelist/pub");
        assert_eq!(
            pairs(&sent),
            vec![
                ("context".to_string(), "authorIp".to_string()),
                ("note".to_string(), "office".to_string()),
                ("status".to_string(), "1".to_string()),
                ("value".to_string(), "10.0.0.1".to_string()),
            ]
        );
    }

    #[test]
    fn disabled_update_sends_zero_status() {
        let (client, recorder) = client();
        recorder.reply(Ok(json!({"entry": {"id": "w1", "value": "bob", "status": 0}})));

        let mut request = WhitelistEntryRequest::new("bob", WhitelistContext::AuthorName);
        request.enabled = false;
        let entry = client.update_whitelist_entry("w1", &request).unwrap();

        assert_eq!(entry.status, Some(false));
        assert_eq!(recorder.last().call, "whitelist/pub/w1");
        assert!(pairs(&recorder.last()).contains(&("status".to_string(), "0".to_string())));
    }

    #[test]
    fn delete_and_missing_entry() {
        let (client, recorder) = client();
        recorder.reply(Ok(json!({})));
        recorder.reply(Err(TransportError::Protocol {
            status: 404,
            reason: "Not Found".to_string(),
            headers: Vec::new(),
            body: "no such entry".to_string(),
        }));

        client.delete_whitelist_entry("w1").unwrap();
        let err = client.read_whitelist_entry("w1").unwrap_err();

        assert_eq!(recorder.sent()[0].call, "whitelist/pub/w1/delete");
        assert_eq!(err.reason(), Some(ErrorReason::UnknownEntry));
        assert!(err.to_string().contains("no such entry"));
    }

    #[test]
    fn list_without_totals_defaults_to_page() {
        let (client, recorder) = client();
        recorder.reply(Ok(json!({"list": [{"id": "w1", "value": "a"}]})));

        let page = client.list_whitelist(0, None).unwrap();

        assert_eq!(page.count, 1);
        assert_eq!(page.total, 1);
        assert!(!page.has_more());
    }
}
