//! Site registration and management.
//!
//! Creating a site is the one unsigned call: it is how a caller obtains a key
//! pair in the first place. Every other call is scoped by a site's public key.

use std::fmt;

use mollom_core::{
    DirectoryCache, Environment, MollomError, REDACTED, Resource, Transport,
};
use mollom_proto::{ListPage, Params, RequestEnvelope};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use super::{MollomRest, page, path};

/// Site fields to register or change. Unset fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SiteRequest {
    /// Site address.
    pub url: Option<String>,
    /// Administrator email.
    pub email: Option<String>,
    /// Expected content languages, ISO 639 codes.
    pub languages: Vec<String>,
    /// CMS name.
    pub platform_name: Option<String>,
    /// CMS version.
    pub platform_version: Option<String>,
    /// Client library name.
    pub client_name: Option<String>,
    /// Client library version.
    pub client_version: Option<String>,
}

impl SiteRequest {
    /// Request for `url` administered by `email`, identifying this library as
    /// the client.
    pub fn new(url: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            email: Some(email.into()),
            client_name: Some(env!("CARGO_PKG_NAME").to_string()),
            client_version: Some(env!("CARGO_PKG_VERSION").to_string()),
            ..Self::default()
        }
    }

    fn to_params(&self) -> Params {
        Params::new()
            .with_opt("url", self.url.as_ref())
            .with_opt("email", self.email.as_ref())
            .with_opt("languages", (!self.languages.is_empty()).then(|| self.languages.clone()))
            .with_opt("platformName", self.platform_name.as_ref())
            .with_opt("platformVersion", self.platform_version.as_ref())
            .with_opt("clientName", self.client_name.as_ref())
            .with_opt("clientVersion", self.client_version.as_ref())
    }
}

/// The `site` member of a response.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteInfo {
    /// Site id.
    #[serde(default)]
    pub id: Option<String>,
    /// Public key.
    pub public_key: String,
    /// Private key. Only returned to the site's owner.
    #[serde(default)]
    pub private_key: Option<String>,
    /// Site address.
    #[serde(default)]
    pub url: Option<String>,
    /// Administrator email.
    #[serde(default)]
    pub email: Option<String>,
    /// Expected content languages.
    #[serde(default)]
    pub languages: Vec<String>,
    /// Subscription details, passed through as sent.
    #[serde(default)]
    pub subscription: Option<Json>,
    /// CMS name.
    #[serde(default)]
    pub platform_name: Option<String>,
    /// CMS version.
    #[serde(default)]
    pub platform_version: Option<String>,
    /// Client library name.
    #[serde(default)]
    pub client_name: Option<String>,
    /// Client library version.
    #[serde(default)]
    pub client_version: Option<String>,
}

impl fmt::Debug for SiteInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SiteInfo")
            .field("id", &self.id)
            .field("public_key", &self.public_key)
            .field("private_key", &self.private_key.as_ref().map(|_| REDACTED))
            .field("url", &self.url)
            .field("email", &self.email)
            .field("languages", &self.languages)
            .finish_non_exhaustive()
    }
}

impl<E, T, C> MollomRest<E, T, C>
where
    E: Environment,
    T: Transport<Output = Json>,
    C: DirectoryCache,
{
    /// Register a new site. Sent without authentication.
    pub fn create_site(&self, request: &SiteRequest) -> Result<SiteInfo, MollomError> {
        let envelope = RequestEnvelope::post("site", request.to_params()).unsigned();
        self.fetch(Resource::Site, &envelope, "site")
    }

    /// Change a site's fields.
    pub fn update_site(
        &self,
        public_key: &str,
        request: &SiteRequest,
    ) -> Result<SiteInfo, MollomError> {
        let envelope = RequestEnvelope::post(path(&["site", public_key]), request.to_params());
        self.fetch(Resource::Site, &envelope, "site")
    }

    /// Read a site. A 404 maps to *unknown site*.
    pub fn read_site(&self, public_key: &str) -> Result<SiteInfo, MollomError> {
        let envelope = RequestEnvelope::get(path(&["site", public_key]), Params::new());
        self.fetch(Resource::Site, &envelope, "site")
    }

    /// Unregister a site.
    pub fn delete_site(&self, public_key: &str) -> Result<(), MollomError> {
        let envelope = RequestEnvelope::post(path(&["site", public_key, "delete"]), Params::new());
        self.send(Resource::Site, &envelope)?;
        Ok(())
    }

    /// One page of the sites these credentials manage.
    pub fn list_sites(
        &self,
        offset: u64,
        count: Option<u64>,
    ) -> Result<ListPage<SiteInfo>, MollomError> {
        let envelope = RequestEnvelope::get("site", page(offset, count));
        self.fetch_list(Resource::Site, &envelope)
    }
}

#[cfg(test)]
mod tests {
    use mollom_core::{ErrorReason, TransportError};
    use mollom_proto::Method;
    use serde_json::json;

    use super::*;
    use crate::rest::testing::{client, pairs};

    #[test]
    fn create_is_unsigned() {
        let (client, recorder) = client();
        recorder.reply(Ok(json!({
            "site": {"id": "s1", "publicKey": "newpub", "privateKey": "newpriv"}
        })));

        let mut request = SiteRequest::new("http://example.org", "admin@example.org");
        request.languages = vec!["en".to_string(), "nl".to_string()];
        let site = client.create_site(&request).unwrap();

        let sent = recorder.last();
        assert!(!sent.signed);
        assert_eq!(sent.call, "site");
        assert_eq!(site.public_key, "newpub");
        let languages: Vec<_> =
            pairs(&sent).into_iter().filter(|(k, _)| k == "languages").collect();
        assert_eq!(languages.len(), 2);
    }

    #[test]
    fn other_calls_are_signed_and_scoped() {
        let (client, recorder) = client();
        recorder.reply(Ok(json!({"site": {"publicKey": "pub"}})));
        recorder.reply(Ok(json!({})));

        client.read_site("pub").unwrap();
        client.delete_site("pub").unwrap();

        let sent = recorder.sent();
        assert!(sent.iter().all(|e| e.signed));
        assert_eq!((sent[0].method, sent[0].call.as_str()), (Method::Get, "site/pub"));
        assert_eq!((sent[1].method, sent[1].call.as_str()), (Method::Post, "site/pub/delete"));
    }

    #[test]
    fn public_key_is_one_segment() {
        let (client, recorder) = client();
        recorder.reply(Ok(json!({})));

        client.delete_site("../x").unwrap();

        assert_eq!(recorder.last().call, "site/..%2Fx/delete");
    }

    #[test]
    fn debug_hides_private_key() {
        let body = json!({"publicKey": "pub", "privateKey": "very-secret"});
        let site: SiteInfo = serde_json::from_value(body).unwrap();

        let rendered = format!("{site:?}");

        assert!(rendered.contains("pub"));
        assert!(!rendered.contains("very-secret"));
        assert!(rendered.contains(REDACTED));
    }

    #[test]
    fn unknown_site() {
        let (client, recorder) = client();
        recorder.reply(Err(TransportError::Protocol {
            status: 404,
            reason: "Not Found".to_string(),
            headers: Vec::new(),
            body: String::new(),
        }));

        let err = client.update_site("gone", &SiteRequest::default()).unwrap_err();

        assert_eq!(err.reason(), Some(ErrorReason::UnknownSite));
    }

    #[test]
    fn list_pages() {
        let (client, recorder) = client();
        recorder.reply(Ok(json!({
            "list": [{"publicKey": "a"}],
            "listCount": "1",
            "listOffset": "10",
            "listTotal": "11"
        })));

        let page = client.list_sites(10, None).unwrap();

        assert_eq!(page.offset, 10);
        assert!(!page.has_more());
        assert_eq!(recorder.last().call, "site");
    }
}
