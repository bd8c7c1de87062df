//! Feedback on earlier checks.

use mollom_core::{DirectoryCache, Environment, ErrorReason, MollomError, Resource, Transport};
use mollom_proto::{Params, RequestEnvelope};
use serde_json::Value as Json;

use super::MollomRest;
use crate::rpc::types::Reason;

/// What the feedback is about. At least one id must be set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedbackTarget {
    /// Checked content.
    pub content_id: Option<String>,
    /// Solved or failed CAPTCHA.
    pub captcha_id: Option<String>,
}

impl FeedbackTarget {
    /// Feedback on content.
    pub fn content(id: impl Into<String>) -> Self {
        Self { content_id: Some(id.into()), captcha_id: None }
    }

    /// Feedback on a CAPTCHA.
    pub fn captcha(id: impl Into<String>) -> Self {
        Self { content_id: None, captcha_id: Some(id.into()) }
    }

    fn is_empty(&self) -> bool {
        self.content_id.is_none() && self.captcha_id.is_none()
    }
}

impl<E, T, C> MollomRest<E, T, C>
where
    E: Environment,
    T: Transport<Output = Json>,
    C: DirectoryCache,
{
    /// Report that content or a CAPTCHA session was unwanted.
    ///
    /// A target without ids fails with *missing id* before anything is sent.
    /// A 400 from the service maps to *unknown reason*.
    pub fn send_feedback(
        &self,
        target: &FeedbackTarget,
        reason: Reason,
    ) -> Result<(), MollomError> {
        if target.is_empty() {
            return Err(MollomError::rejected(
                Resource::Feedback,
                ErrorReason::MissingId,
                "feedback needs a content id or a captcha id",
            ));
        }
        let params = Params::new()
            .with_opt("contentId", target.content_id.as_ref())
            .with_opt("captchaId", target.captcha_id.as_ref())
            .with("reason", reason.as_rest_str());
        self.send(Resource::Feedback, &RequestEnvelope::post("feedback", params))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use mollom_core::TransportError;
    use serde_json::json;

    use super::*;
    use crate::rest::testing::{client, pairs};

    #[test]
    fn empty_target_is_rejected_locally() {
        let (client, recorder) = client();

        let err = client.send_feedback(&FeedbackTarget::default(), Reason::Spam).unwrap_err();

        assert_eq!(err.reason(), Some(ErrorReason::MissingId));
        assert_eq!(err.code(), 400);
        assert!(recorder.sent().is_empty());
    }

    #[test]
    fn sends_rest_reason_name() {
        let (client, recorder) = client();
        recorder.reply(Ok(json!({})));

        client.send_feedback(&FeedbackTarget::content("c1"), Reason::LowQuality).unwrap();

        assert_eq!(
            pairs(&recorder.last()),
            vec![
                ("contentId".to_string(), "c1".to_string()),
                ("reason".to_string(), "quality".to_string()),
            ]
        );
    }

    #[test]
    fn bad_request_is_unknown_reason() {
        let (client, recorder) = client();
        recorder.reply(Err(TransportError::Protocol {
            status: 400,
            reason: "Bad Request".to_string(),
            headers: Vec::new(),
            body: String::new(),
        }));

        let err = client.send_feedback(&FeedbackTarget::captcha("k1"), Reason::Spam).unwrap_err();

        assert_eq!(err.reason(), Some(ErrorReason::UnknownReason));
    }
}
