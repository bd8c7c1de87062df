//! CAPTCHA creation and verification.

use mollom_core::{DirectoryCache, Environment, MollomError, Resource, Transport};
use mollom_proto::{Params, RequestEnvelope, rest::lenient_opt_bool};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use super::{MollomRest, path};
use crate::rpc::types::CaptchaKind;

/// The `captcha` member of a response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptchaResult {
    /// CAPTCHA id, quoted when verifying.
    pub id: String,
    /// Where to fetch the challenge. Present on creation.
    #[serde(default)]
    pub url: Option<String>,
    /// Verification outcome. Present after a solution was submitted.
    #[serde(default, deserialize_with = "lenient_opt_bool")]
    pub solved: Option<bool>,
    /// Short explanation of a failed verification.
    #[serde(default)]
    pub reason: Option<String>,
}

impl<E, T, C> MollomRest<E, T, C>
where
    E: Environment,
    T: Transport<Output = Json>,
    C: DirectoryCache,
{
    /// Create a CAPTCHA, optionally tied to checked content.
    pub fn create_captcha(
        &self,
        kind: CaptchaKind,
        content_id: Option<&str>,
    ) -> Result<CaptchaResult, MollomError> {
        let params =
            Params::new().with("type", kind.as_str()).with_opt("contentId", content_id);
        self.fetch(Resource::Captcha, &RequestEnvelope::post("captcha", params), "captcha")
    }

    /// Submit a solution.
    ///
    /// A 404 maps to *does not exist*, 409 to *already processed* and 410 to
    /// *expired*.
    pub fn verify_captcha(&self, id: &str, solution: &str) -> Result<CaptchaResult, MollomError> {
        let params = Params::new().with("solution", solution);
        let envelope = RequestEnvelope::post(path(&["captcha", id]), params);
        self.fetch(Resource::Captcha, &envelope, "captcha")
    }
}
