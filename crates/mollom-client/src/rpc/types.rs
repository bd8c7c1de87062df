//! Typed requests and responses of the XML-RPC API.

use std::{fmt, str::FromStr};

use mollom_core::MollomError;
use mollom_proto::{CodecError, Params, Value};
use serde::{Deserialize, Serialize};

/// Mollom's verdict on a piece of content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SpamVerdict {
    /// 1: legitimate.
    Ham,
    /// 2: spam.
    Spam,
    /// 3: ask the author to solve a CAPTCHA.
    Unsure,
}

impl SpamVerdict {
    /// Decode the wire code.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Self::Ham),
            2 => Some(Self::Spam),
            3 => Some(Self::Unsure),
            _ => None,
        }
    }
}

/// Content to check. Unset fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentSubmission {
    /// Session from an earlier check of the same content.
    pub session_id: Option<String>,
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
}

impl ContentSubmission {
    pub(crate) fn to_params(&self) -> Params {
        Params::new()
            .with_opt("session_id", self.session_id.as_ref())
            .with_opt("post_title", self.post_title.as_ref())
            .with_opt("post_body", self.post_body.as_ref())
            .with_opt("author_name", self.author_name.as_ref())
            .with_opt("author_url", self.author_url.as_ref())
            .with_opt("author_mail", self.author_mail.as_ref())
            .with_opt("author_openid", self.author_openid.as_ref())
            .with_opt("author_ip", self.author_ip.as_ref())
            .with_opt("author_id", self.author_id.as_ref())
    }
}

/// Result of `checkContent`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentCheck {
    /// Spam classification.
    pub spam: SpamVerdict,
    /// Quality estimate in `[0, 1]`.
    pub quality: f64,
    /// Session to quote in follow-up calls about this content.
    pub session_id: String,
}

impl ContentCheck {
    pub(crate) fn decode(value: &Value) -> Result<Self, MollomError> {
        let code = value.int_member("spam")?;
        let spam = SpamVerdict::from_code(code).ok_or_else(|| CodecError::InvalidScalar {
            kind: "spam",
            raw: code.to_string(),
        })?;
        let quality = value.f64_member("quality")?;
        if !(0.0..=1.0).contains(&quality) {
            let raw = quality.to_string();
            return Err(CodecError::InvalidScalar { kind: "quality", raw }.into());
        }
        Ok(Self { spam, quality, session_id: value.str_member("session_id")?.to_string() })
    }
}

/// Why content is unwanted. Used for feedback and blacklist entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Reason {
    /// Spam.
    Spam,
    /// Profanity.
    Profanity,
    /// Low quality.
    #[serde(alias = "quality")]
    LowQuality,
    /// Unwanted for another reason.
    Unwanted,
}

impl Reason {
    /// Wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Spam => "spam",
            Self::Profanity => "profanity",
            Self::LowQuality => "low-quality",
            Self::Unwanted => "unwanted",
        }
    }

    /// Name used by the REST API, which spells low quality `quality`.
    pub fn as_rest_str(self) -> &'static str {
        match self {
            Self::LowQuality => "quality",
            other => other.as_str(),
        }
    }
}

/// Kind of CAPTCHA.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptchaKind {
    /// Image.
    Image,
    /// Audio.
    Audio,
}

impl CaptchaKind {
    /// Wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Audio => "audio",
        }
    }
}

/// A generated CAPTCHA.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Captcha {
    /// Session to quote when checking the solution.
    pub session_id: String,
    /// Where the challenge can be fetched.
    pub url: String,
}

impl Captcha {
    pub(crate) fn decode(value: &Value) -> Result<Self, MollomError> {
        Ok(Self {
            session_id: value.str_member("session_id")?.to_string(),
            url: value.str_member("url")?.to_string(),
        })
    }
}

/// Counter reported by `getStatistics`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatisticsType {
    /// Days Mollom has been in use.
    TotalDays,
    /// Messages accepted as ham.
    TotalAccepted,
    /// Messages rejected as spam.
    TotalRejected,
    /// Accepted yesterday.
    YesterdayAccepted,
    /// Rejected yesterday.
    YesterdayRejected,
    /// Accepted today.
    TodayAccepted,
    /// Rejected today.
    TodayRejected,
}

impl StatisticsType {
    /// Every counter.
    pub const ALL: [Self; 7] = [
        Self::TotalDays,
        Self::TotalAccepted,
        Self::TotalRejected,
        Self::YesterdayAccepted,
        Self::YesterdayRejected,
        Self::TodayAccepted,
        Self::TodayRejected,
    ];

    /// Wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TotalDays => "total_days",
            Self::TotalAccepted => "total_accepted",
            Self::TotalRejected => "total_rejected",
            Self::YesterdayAccepted => "yesterday_accepted",
            Self::YesterdayRejected => "yesterday_rejected",
            Self::TodayAccepted => "today_accepted",
            Self::TodayRejected => "today_rejected",
        }
    }
}

impl fmt::Display for StatisticsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatisticsType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown statistics type `{s}`"))
    }
}

/// One `detectLanguage` candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LanguageGuess {
    /// ISO 639 code.
    pub language: String,
    /// Confidence in `[0, 1]`.
    pub confidence: f64,
}

impl LanguageGuess {
    pub(crate) fn decode_all(value: &Value) -> Result<Vec<Self>, MollomError> {
        array(value, "languages")?
            .iter()
            .map(|item| -> Result<Self, MollomError> {
                Ok(Self {
                    language: item.str_member("language")?.to_string(),
                    confidence: item.f64_member("confidence")?,
                })
            })
            .collect()
    }
}

/// How a blacklisted text is matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlacklistMatch {
    /// Whole-field match.
    Exact,
    /// Substring match.
    Contains,
}

impl BlacklistMatch {
    /// Wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Contains => "contains",
        }
    }
}

/// A blacklisted text snippet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlacklistText {
    /// The snippet.
    pub text: String,
    /// Match mode, if reported.
    pub match_mode: Option<String>,
    /// Reason, if reported.
    pub reason: Option<String>,
}

impl BlacklistText {
    pub(crate) fn decode_all(value: &Value) -> Result<Vec<Self>, MollomError> {
        array(value, "blacklist")?
            .iter()
            .map(|item| -> Result<Self, MollomError> {
                match item {
                    Value::String(text) => {
                        Ok(Self { text: text.clone(), match_mode: None, reason: None })
                    },
                    _ => Ok(Self {
                        text: item.str_member("text")?.to_string(),
                        match_mode: item.get("match").and_then(Value::as_str).map(String::from),
                        reason: item.get("reason").and_then(Value::as_str).map(String::from),
                    }),
                }
            })
            .collect()
    }
}

/// A blacklisted URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlacklistUrl {
    /// The URL.
    pub url: String,
    /// When it was added, if reported.
    pub added: Option<String>,
}

impl BlacklistUrl {
    pub(crate) fn decode_all(value: &Value) -> Result<Vec<Self>, MollomError> {
        array(value, "blacklist")?
            .iter()
            .map(|item| -> Result<Self, MollomError> {
                match item {
                    Value::String(url) => Ok(Self { url: url.clone(), added: None }),
                    _ => Ok(Self {
                        url: item.str_member("url")?.to_string(),
                        added: item.get("added").and_then(Value::as_str).map(ToString::to_string),
                    }),
                }
            })
            .collect()
    }
}

fn array<'a>(value: &'a Value, what: &str) -> Result<&'a [Value], MollomError> {
    value.as_array().ok_or_else(|| CodecError::unexpected(what, "array").into())
}

/// Decode a boolean reply.
pub(crate) fn boolean(value: &Value, call: &str) -> Result<bool, MollomError> {
    value.as_bool().ok_or_else(|| CodecError::unexpected(call, "boolean").into())
}
