//! Legacy XML-RPC API.
//!
//! Every call is `mollom.<name>` with one struct argument. Replies are
//! decoded into the types in [`types`]; anything that does not decode is a
//! [`MollomError::MalformedResponse`].

pub mod types;

use std::sync::Arc;

use mollom_core::{
    DirectoryCache, Dispatcher, Environment, MollomError, Resolved, Resource, ServerDirectory,
    Transport,
};
use mollom_proto::{Params, RequestEnvelope, Value};
use types::{
    BlacklistMatch, BlacklistText, BlacklistUrl, Captcha, CaptchaKind, ContentCheck,
    ContentSubmission, LanguageGuess, Reason, StatisticsType, boolean,
};

use crate::{
    SystemEnv,
    config::{MollomConfig, TransportKind},
    http::XmlRpcTransport,
    runtime::{SharedCache, shared_directory},
};

/// Client for the XML-RPC API.
pub struct Mollom<E = SystemEnv, T = XmlRpcTransport, C = SharedCache> {
    dispatcher: Dispatcher<E, T, C>,
}

impl Mollom {
    /// Production client for an XML-RPC configuration.
    pub fn from_config(config: &MollomConfig) -> Result<Self, MollomError> {
        config.validate()?;
        if config.general.transport != TransportKind::XmlRpc {
            return Err(MollomError::Config {
                reason: "general.transport must be \"xmlrpc\" for the XML-RPC client".to_string(),
            });
        }
        let transport =
            XmlRpcTransport::new(config.credentials(), config.version(), config.timeout());
        let directory = shared_directory(config);
        let dispatcher =
            Dispatcher::new(SystemEnv::new(), transport, directory, config.max_retries());
        Ok(Self::new(dispatcher))
    }
}

impl<E, T, C> Mollom<E, T, C>
where
    E: Environment,
    T: Transport<Output = Value>,
    C: DirectoryCache,
{
    /// Client over an existing dispatcher.
    pub fn new(dispatcher: Dispatcher<E, T, C>) -> Self {
        Self { dispatcher }
    }

    /// Build from parts.
    pub fn with_parts(
        env: E,
        transport: T,
        directory: Arc<ServerDirectory<C>>,
        max_retries: u32,
    ) -> Self {
        Self::new(Dispatcher::new(env, transport, directory, max_retries))
    }

    /// Underlying dispatcher.
    pub fn dispatcher(&self) -> &Dispatcher<E, T, C> {
        &self.dispatcher
    }

    fn call(&self, resource: Resource, name: &str, params: Params) -> Result<Value, MollomError> {
        let envelope = RequestEnvelope::rpc(name, params);
        self.dispatcher
            .invoke(&envelope)
            .map(|done| done.value)
            .map_err(|e| e.in_resource(resource))
    }

    fn call_bool(
        &self,
        resource: Resource,
        name: &str,
        params: Params,
    ) -> Result<bool, MollomError> {
        boolean(&self.call(resource, name, params)?, name)
    }

    /// Check content for spam and quality.
    pub fn check_content(
        &self,
        submission: &ContentSubmission,
    ) -> Result<ContentCheck, MollomError> {
        let value = self.call(Resource::Content, "checkContent", submission.to_params())?;
        ContentCheck::decode(&value)
    }

    /// Report that checked content was unwanted.
    pub fn send_feedback(&self, session_id: &str, feedback: Reason) -> Result<bool, MollomError> {
        let params =
            Params::new().with("session_id", session_id).with("feedback", feedback.as_str());
        self.call_bool(Resource::Feedback, "sendFeedback", params)
    }

    /// Request a CAPTCHA.
    pub fn captcha(
        &self,
        kind: CaptchaKind,
        session_id: Option<&str>,
        author_ip: Option<&str>,
    ) -> Result<Captcha, MollomError> {
        let name = match kind {
            CaptchaKind::Image => "getImageCaptcha",
            CaptchaKind::Audio => "getAudioCaptcha",
        };
        let params =
            Params::new().with_opt("session_id", session_id).with_opt("author_ip", author_ip);
        Captcha::decode(&self.call(Resource::Captcha, name, params)?)
    }

    /// Request an image CAPTCHA.
    pub fn image_captcha(
        &self,
        session_id: Option<&str>,
        author_ip: Option<&str>,
    ) -> Result<Captcha, MollomError> {
        self.captcha(CaptchaKind::Image, session_id, author_ip)
    }

    /// Request an audio CAPTCHA.
    pub fn audio_captcha(
        &self,
        session_id: Option<&str>,
        author_ip: Option<&str>,
    ) -> Result<Captcha, MollomError> {
        self.captcha(CaptchaKind::Audio, session_id, author_ip)
    }

    /// Check a CAPTCHA solution.
    pub fn check_captcha(&self, session_id: &str, solution: &str) -> Result<bool, MollomError> {
        let params = Params::new().with("session_id", session_id).with("solution", solution);
        self.call_bool(Resource::Captcha, "checkCaptcha", params)
    }

    /// Read a usage counter.
    pub fn statistics(&self, kind: StatisticsType) -> Result<i64, MollomError> {
        let params = Params::new().with("type", kind.as_str());
        let value = self.call(Resource::Connection, "getStatistics", params)?;
        value
            .as_i64()
            .ok_or_else(|| mollom_proto::CodecError::unexpected("getStatistics", "int").into())
    }

    /// Returns true if the key pair is valid.
    pub fn verify_key(&self) -> Result<bool, MollomError> {
        self.call_bool(Resource::Connection, "verifyKey", Params::new())
    }

    /// Guess the language of `text`, most likely first.
    pub fn detect_language(&self, text: &str) -> Result<Vec<LanguageGuess>, MollomError> {
        let params = Params::new().with("text", text);
        let value = self.call(Resource::Content, "detectLanguage", params)?;
        let mut guesses = LanguageGuess::decode_all(&value)?;
        guesses.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        Ok(guesses)
    }

    /// Blacklist a text snippet for this site.
    pub fn add_blacklist_text(
        &self,
        text: &str,
        mode: BlacklistMatch,
        reason: Reason,
    ) -> Result<bool, MollomError> {
        let params = Params::new()
            .with("text", text)
            .with("match", mode.as_str())
            .with("reason", reason.as_str());
        self.call_bool(Resource::Blacklist, "addBlacklistText", params)
    }

    /// Remove a blacklisted text snippet.
    pub fn remove_blacklist_text(&self, text: &str) -> Result<bool, MollomError> {
        let params = Params::new().with("text", text);
        self.call_bool(Resource::Blacklist, "removeBlacklistText", params)
    }

    /// Blacklisted text snippets for this site.
    pub fn list_blacklist_text(&self) -> Result<Vec<BlacklistText>, MollomError> {
        let value = self.call(Resource::Blacklist, "listBlacklistText", Params::new())?;
        BlacklistText::decode_all(&value)
    }

    /// Blacklist a URL for this site.
    pub fn add_blacklist_url(&self, url: &str) -> Result<bool, MollomError> {
        let params = Params::new().with("url", url);
        self.call_bool(Resource::Blacklist, "addBlacklistURL", params)
    }

    /// Remove a blacklisted URL.
    pub fn remove_blacklist_url(&self, url: &str) -> Result<bool, MollomError> {
        let params = Params::new().with("url", url);
        self.call_bool(Resource::Blacklist, "removeBlacklistURL", params)
    }

    /// Blacklisted URLs for this site.
    pub fn list_blacklist_url(&self) -> Result<Vec<BlacklistUrl>, MollomError> {
        let value = self.call(Resource::Blacklist, "listBlacklistURL", Params::new())?;
        BlacklistUrl::decode_all(&value)
    }

    /// Current server list, refreshed first if `force` is set.
    pub fn server_list(&self, force: bool) -> Resolved {
        self.dispatcher.servers(force)
    }
}
