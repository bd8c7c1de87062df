//! Per-site blacklist.

use mollom_core::{DirectoryCache, Environment, MollomError, Resource, Transport};
use mollom_proto::{ListPage, Params, RequestEnvelope, rest};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use super::{MollomRest, page, path};
use crate::rpc::types::{BlacklistMatch, Reason};

/// Which part of a submission an entry applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BlacklistContext {
    /// Every field.
    AllFields,
    /// Author IP.
    AuthorIp,
    /// Author id.
    AuthorId,
    /// Author name.
    AuthorName,
    /// Author email.
    AuthorMail,
    /// Links in the body.
    Links,
    /// Post title.
    PostTitle,
}

impl BlacklistContext {
    /// Wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AllFields => "allFields",
            Self::AuthorIp => "authorIp",
            Self::AuthorId => "authorId",
            Self::AuthorName => "authorName",
            Self::AuthorMail => "authorMail",
            Self::Links => "links",
            Self::PostTitle => "postTitle",
        }
    }
}

/// Fields of a blacklist entry to create or update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlacklistEntryRequest {
    /// Text or pattern to block.
    pub value: String,
    /// Why it is blocked.
    pub reason: Reason,
    /// Where it applies.
    pub context: BlacklistContext,
    /// How it matches.
    pub match_mode: BlacklistMatch,
    /// Whether the entry is active.
    pub enabled: bool,
    /// Free-form note.
    pub note: Option<String>,
}

impl BlacklistEntryRequest {
    /// Active entry blocking `value` anywhere as unwanted.
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            reason: Reason::Unwanted,
            context: BlacklistContext::AllFields,
            match_mode: BlacklistMatch::Contains,
            enabled: true,
            note: None,
        }
    }

    fn to_params(&self) -> Params {
        Params::new()
            .with("value", self.value.as_str())
            .with("reason", self.reason.as_rest_str())
            .with("context", self.context.as_str())
            .with("match", self.match_mode.as_str())
            .with("status", self.enabled)
            .with_opt("note", self.note.as_ref())
    }
}

/// The `entry` member of a blacklist response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlacklistEntry {
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
    /// Blocked text.
    pub value: String,
    /// Why it is blocked.
    #[serde(default)]
    pub reason: Option<Reason>,
    /// Where it applies.
    #[serde(default)]
    pub context: Option<BlacklistContext>,
    /// How it matches.
    #[serde(default, rename = "match")]
    pub match_mode: Option<BlacklistMatch>,
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
    fn blacklist_path(&self, id: Option<&str>) -> String {
        match id {
            Some(id) => path(&["blacklist", self.public_key(), id]),
            None => path(&["blacklist", self.public_key()]),
        }
    }

    /// Add an entry.
    pub fn create_blacklist_entry(
        &self,
        request: &BlacklistEntryRequest,
    ) -> Result<BlacklistEntry, MollomError> {
        let envelope = RequestEnvelope::post(self.blacklist_path(None), request.to_params());
        self.fetch(Resource::Blacklist, &envelope, "entry")
    }

    /// Replace an entry's fields.
    pub fn update_blacklist_entry(
        &self,
        id: &str,
        request: &BlacklistEntryRequest,
    ) -> Result<BlacklistEntry, MollomError> {
        let envelope = RequestEnvelope::post(self.blacklist_path(Some(id)), request.to_params());
        self.fetch(Resource::Blacklist, &envelope, "entry")
    }

    /// Remove an entry.
    pub fn delete_blacklist_entry(&self, id: &str) -> Result<(), MollomError> {
        let path = format!("{}/delete", self.blacklist_path(Some(id)));
        self.send(Resource::Blacklist, &RequestEnvelope::post(path, Params::new()))?;
        Ok(())
    }

    /// Read one entry. A 404 maps to *unknown entry*.
    pub fn read_blacklist_entry(&self, id: &str) -> Result<BlacklistEntry, MollomError> {
        let envelope = RequestEnvelope::get(self.blacklist_path(Some(id)), Params::new());
        self.fetch(Resource::Blacklist, &envelope, "entry")
    }

    /// One page of entries.
    pub fn list_blacklist(
        &self,
        offset: u64,
        count: Option<u64>,
    ) -> Result<ListPage<BlacklistEntry>, MollomError> {
        let envelope = RequestEnvelope::get(self.blacklist_path(None), page(offset, count));
        self.fetch_list(Resource::Blacklist, &envelope)
    }
}

#[cfg(test)]
mod tests {
    use mollom_core::{ErrorReason, TransportError};
    use mollom_proto::Method;
    use serde_json::json;

    use super::*;
    use crate::rest::testing::{client, pairs};

    fn pair(k: &str, v: &str) -> (String, String) {
        (k.to_string(), v.to_string())
    }

    #[test]
    fn new_entry_uses_service_defaults() {
        let (client, recorder) = client();
        recorder.reply(Ok(json!({"entry": {"id": "b1", "value": "viagra"}})));

        client.create_blacklist_entry(&BlacklistEntryRequest::new("viagra")).unwrap();

        let sent = recorder.last();
        assert_eq!(sent.call, "blacklist/pub");
        assert_eq!(
            pairs(&sent),
            vec![
                pair("context", "allFields"),
                pair("match", "contains"),
                pair("reason", "unwanted"),
                pair("status", "1"),
                pair("value", "viagra"),
            ]
        );
    }

    #[test]
    fn entry_decodes_wire_names() {
        let (client, recorder) = client();
        recorder.reply(Ok(json!({
            "entry": {
                "id": "b1",
                "created": "1328659200",
                "status": "1",
                "matchCount": 3,
                "value": "cheap",
                "reason": "quality",
                "context": "postTitle",
                "match": "exact"
            }
        })));

        let entry = client.read_blacklist_entry("b1").unwrap();

        assert_eq!(recorder.last().method, Method::Get);
        assert_eq!(recorder.last().call, "blacklist/pub/b1");
        assert_eq!(entry.created, Some(1_328_659_200));
        assert_eq!(entry.status, Some(true));
        assert_eq!(entry.match_count, Some(3));
        assert_eq!(entry.reason, Some(Reason::LowQuality));
        assert_eq!(entry.context, Some(BlacklistContext::PostTitle));
        assert_eq!(entry.match_mode, Some(BlacklistMatch::Exact));
    }

    #[test]
    fn delete_posts_to_action_path() {
        let (client, recorder) = client();
        recorder.reply(Ok(json!({})));

        client.delete_blacklist_entry("b1").unwrap();

        let sent = recorder.last();
        assert_eq!(sent.method, Method::Post);
        assert_eq!(sent.call, "blacklist/pub/b1/delete");
    }

    #[test]
    fn list_decodes_page() {
        let (client, recorder) = client();
        recorder.reply(Ok(json!({
            "list": [{"id": "b1", "value": "a"}, {"id": "b2", "value": "b"}],
            "listCount": 2,
            "listOffset": 0,
            "listTotal": 5
        })));

        let page = client.list_blacklist(0, Some(2)).unwrap();

        assert_eq!(page.items.len(), 2);
        assert!(page.has_more());
        assert_eq!(pairs(&recorder.last()), vec![pair("count", "2"), pair("offset", "0")]);
    }

    #[test]
    fn unknown_entry() {
        let (client, recorder) = client();
        recorder.reply(Err(TransportError::Protocol {
            status: 404,
            reason: "Not Found".to_string(),
            headers: Vec::new(),
            body: String::new(),
        }));

        let err = client.read_blacklist_entry("nope").unwrap_err();

        assert_eq!(err.reason(), Some(ErrorReason::UnknownEntry));
    }
}
