//! Content checks.

use mollom_core::{DirectoryCache, Environment, MollomError, Resource, Transport};
use mollom_proto::{Params, RequestEnvelope, rest::lenient_opt_bool};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use super::{MollomRest, path};

/// Analysis to run on submitted content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Check {
    /// Spam classification.
    Spam,
    /// Quality score.
    Quality,
    /// Profanity score.
    Profanity,
    /// Language detection.
    Language,
    /// Sentiment score.
    Sentiment,
}

impl Check {
    /// Wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Spam => "spam",
            Self::Quality => "quality",
            Self::Profanity => "profanity",
            Self::Language => "language",
            Self::Sentiment => "sentiment",
        }
    }
}

/// How eagerly content is classified as spam.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strictness {
    /// Prefer rejecting.
    Strict,
    /// Service default.
    Normal,
    /// Prefer accepting.
    Relaxed,
}

impl Strictness {
    /// Wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Normal => "normal",
            Self::Relaxed => "relaxed",
        }
    }
}

/// Content to check. Unset fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentRequest {
    /// Post title.
    pub post_title: Option<String>,
    /// Post body.
    pub post_body: Option<String>,
    /// Author display name.
    pub author_name: Option<String>,
    /// Author website.
    pub author_url: Option<String>,
    /// Author email address.
    pub author_mail: Option<String>,
    /// Author OpenID.
    pub author_openid: Option<String>,
    /// Author IP address.
    pub author_ip: Option<String>,
    /// Author's user id on the site.
    pub author_id: Option<String>,
    /// Analyses to run. Empty leaves the choice to the service.
    pub checks: Vec<Check>,
    /// Whether an unsure verdict is acceptable, or spam must be decided.
    pub unsure: Option<bool>,
    /// Spam strictness.
    pub strictness: Option<Strictness>,
    /// Value of a honeypot form field.
    pub honeypot: Option<String>,
    /// Whether the site stored the content.
    pub stored: Option<bool>,
    /// Where the content was published.
    pub url: Option<String>,
    /// Page the content responds to.
    pub context_url: Option<String>,
    /// Title of the page the content responds to.
    pub context_title: Option<String>,
}

impl ContentRequest {
    /// Request checking only a post body.
    pub fn body(text: impl Into<String>) -> Self {
        Self { post_body: Some(text.into()), ..Self::default() }
    }

    pub(crate) fn to_params(&self) -> Params {
        let checks: Vec<&str> = self.checks.iter().map(|c| c.as_str()).collect();
        Params::new()
            .with_opt("postTitle", self.post_title.as_ref())
            .with_opt("postBody", self.post_body.as_ref())
            .with_opt("authorName", self.author_name.as_ref())
            .with_opt("authorUrl", self.author_url.as_ref())
            .with_opt("authorMail", self.author_mail.as_ref())
            .with_opt("authorOpenid", self.author_openid.as_ref())
            .with_opt("authorIp", self.author_ip.as_ref())
            .with_opt("authorId", self.author_id.as_ref())
            .with_opt("checks", (!checks.is_empty()).then_some(checks))
            .with_opt("unsure", self.unsure)
            .with_opt("strictness", self.strictness.map(Strictness::as_str))
            .with_opt("honeypot", self.honeypot.as_ref())
            .with_opt("stored", self.stored)
            .with_opt("url", self.url.as_ref())
            .with_opt("contextUrl", self.context_url.as_ref())
            .with_opt("contextTitle", self.context_title.as_ref())
    }
}

/// Spam verdict of a REST check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpamClassification {
    /// Legitimate.
    Ham,
    /// Spam.
    Spam,
    /// Ask the author to solve a CAPTCHA.
    Unsure,
}

/// Detected language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageScore {
    /// ISO 639 code.
    pub language_code: String,
    /// Confidence in `[0, 1]`.
    #[serde(default)]
    pub language_score: f64,
}

/// The `content` member of a check response. Scores are present only for the
/// checks that ran.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentResult {
    /// Content id, used for follow-up checks, CAPTCHAs and feedback.
    pub id: String,
    /// Spam verdict.
    #[serde(default)]
    pub spam_classification: Option<SpamClassification>,
    /// Spam probability.
    #[serde(default)]
    pub spam_score: Option<f64>,
    /// Quality estimate.
    #[serde(default)]
    pub quality_score: Option<f64>,
    /// Profanity estimate.
    #[serde(default)]
    pub profanity_score: Option<f64>,
    /// Sentiment estimate.
    #[serde(default)]
    pub sentiment_score: Option<f64>,
    /// Detected languages.
    #[serde(default)]
    pub languages: Vec<LanguageScore>,
    /// Stored flag as recorded by the service.
    #[serde(default, deserialize_with = "lenient_opt_bool")]
    pub stored: Option<bool>,
    /// Short explanation for the verdict.
    #[serde(default)]
    pub reason: Option<String>,
}

impl<E, T, C> MollomRest<E, T, C>
where
    E: Environment,
    T: Transport<Output = Json>,
    C: DirectoryCache,
{
    /// Submit new content for checking.
    pub fn check_content(&self, request: &ContentRequest) -> Result<ContentResult, MollomError> {
        let envelope = RequestEnvelope::post("content", request.to_params());
        self.fetch(Resource::Content, &envelope, "content")
    }

    /// Re-check content after an edit, keeping its id.
    pub fn update_content(
        &self,
        id: &str,
        request: &ContentRequest,
    ) -> Result<ContentResult, MollomError> {
        let envelope = RequestEnvelope::post(path(&["content", id]), request.to_params());
        self.fetch(Resource::Content, &envelope, "content")
    }
}

#[cfg(test)]
mod tests {
    use mollom_proto::Method;
    use serde_json::json;

    use super::*;
    use crate::rest::testing::{client, pairs};

    fn pair(k: &str, v: &str) -> (String, String) {
        (k.to_string(), v.to_string())
    }

    #[test]
    fn only_set_fields_are_sent() {
        let (client, recorder) = client();
        recorder.reply(Ok(json!({"content": {"id": "c1"}})));

        let request = ContentRequest {
            author_name: Some("alice".to_string()),
            ..ContentRequest::body("hello")
        };
        client.check_content(&request).unwrap();

        let sent = recorder.last();
        assert_eq!(sent.method, Method::Post);
        assert_eq!(sent.call, "content");
        assert_eq!(pairs(&sent), vec![pair("authorName", "alice"), pair("postBody", "hello")]);
    }

    #[test]
    fn checks_repeat_and_flags_are_numeric() {
        let request = ContentRequest {
            checks: vec![Check::Spam, Check::Language],
            unsure: Some(false),
            strictness: Some(Strictness::Relaxed),
            ..ContentRequest::default()
        };

        assert_eq!(
            request.to_params().to_form_pairs(),
            vec![
                pair("checks", "spam"),
                pair("checks", "language"),
                pair("strictness", "relaxed"),
                pair("unsure", "0"),
            ]
        );
    }

    #[test]
    fn result_decodes_scores_present() {
        let (client, recorder) = client();
        recorder.reply(Ok(json!({
            "content": {
                "id": "c1",
                "spamClassification": "unsure",
                "spamScore": 0.5,
                "languages": [{"languageCode": "en", "languageScore": 0.9}],
                "stored": "1"
            }
        })));

        let result = client.check_content(&ContentRequest::body("x")).unwrap();

        assert_eq!(result.id, "c1");
        assert_eq!(result.spam_classification, Some(SpamClassification::Unsure));
        assert_eq!(result.spam_score, Some(0.5));
        assert_eq!(result.quality_score, None);
        assert_eq!(result.languages[0].language_code, "en");
        assert_eq!(result.stored, Some(true));
    }

    #[test]
    fn update_targets_the_content_id() {
        let (client, recorder) = client();
        recorder.reply(Ok(json!({"content": {"id": "c1"}})));

        client.update_content("c1", &ContentRequest::body("edited")).unwrap();

        assert_eq!(recorder.last().call, "content/c1");
    }
}
