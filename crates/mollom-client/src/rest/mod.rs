//! REST API.
//!
//! Resources live under `{server}/{version}/`. Requests are form encoded and
//! OAuth signed; replies are JSON with the payload under a named member.
//! Each submodule adds the calls for one resource to [`MollomRest`].

pub mod blacklist;
pub mod captcha;
pub mod content;
pub mod feedback;
pub mod site;
pub mod whitelist;

use std::sync::Arc;

use mollom_core::{
    DirectoryCache, Dispatcher, Environment, MollomError, Resource, ServerDirectory, Transport,
};
use mollom_proto::{ListPage, Params, RequestEnvelope, rest};
use serde::de::DeserializeOwned;
use serde_json::Value as Json;

use crate::{
    SystemEnv,
    config::{MollomConfig, TransportKind},
    http::RestTransport,
    runtime::{SharedCache, shared_directory},
};

/// Client for the REST API.
pub struct MollomRest<E = SystemEnv, T = RestTransport, C = SharedCache> {
    dispatcher: Dispatcher<E, T, C>,
    public_key: String,
}

impl MollomRest {
    /// Production client for a REST configuration.
    pub fn from_config(config: &MollomConfig) -> Result<Self, MollomError> {
        config.validate()?;
        if config.general.transport != TransportKind::Rest {
            return Err(MollomError::Config {
                reason: "general.transport must be \"rest\" for the REST client".to_string(),
            });
        }
        let credentials = config.credentials();
        let public_key = credentials.public_key().to_string();
        let transport = RestTransport::new(credentials, config.version(), config.timeout());
        let directory = shared_directory(config);
        let dispatcher =
            Dispatcher::new(SystemEnv::new(), transport, directory, config.max_retries());
        Ok(Self::new(dispatcher, public_key))
    }
}

impl<E, T, C> MollomRest<E, T, C>
where
    E: Environment,
    T: Transport<Output = Json>,
    C: DirectoryCache,
{
    /// Client over an existing dispatcher. `public_key` scopes the
    /// blacklist, whitelist and site paths.
    pub fn new(dispatcher: Dispatcher<E, T, C>, public_key: impl Into<String>) -> Self {
        Self { dispatcher, public_key: public_key.into() }
    }

    /// Build from parts.
    pub fn with_parts(
        env: E,
        transport: T,
        directory: Arc<ServerDirectory<C>>,
        max_retries: u32,
        public_key: impl Into<String>,
    ) -> Self {
        Self::new(Dispatcher::new(env, transport, directory, max_retries), public_key)
    }

    /// Underlying dispatcher.
    pub fn dispatcher(&self) -> &Dispatcher<E, T, C> {
        &self.dispatcher
    }

    /// Public key the client acts for.
    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    fn send(&self, resource: Resource, envelope: &RequestEnvelope) -> Result<Json, MollomError> {
        self.dispatcher
            .invoke(envelope)
            .map(|done| done.value)
            .map_err(|e| e.in_resource(resource))
    }

    fn fetch<R: DeserializeOwned>(
        &self,
        resource: Resource,
        envelope: &RequestEnvelope,
        member: &str,
    ) -> Result<R, MollomError> {
        let doc = self.send(resource, envelope)?;
        Ok(rest::decode(&doc, member)?)
    }

    fn fetch_list<R: DeserializeOwned>(
        &self,
        resource: Resource,
        envelope: &RequestEnvelope,
    ) -> Result<ListPage<R>, MollomError> {
        let doc = self.send(resource, envelope)?;
        Ok(rest::decode_list(&doc)?)
    }
}

/// Resource path from its segments, each percent-encoded so ids cannot add
/// segments or a query.
fn path(segments: &[&str]) -> String {
    segments.iter().map(|s| urlencoding::encode(s)).collect::<Vec<_>>().join("/")
}

/// Listing window: `offset` plus an optional page size.
fn page(offset: u64, count: Option<u64>) -> Params {
    Params::new()
        .with("offset", offset_value(offset))
        .with_opt("count", count.map(offset_value))
}

fn offset_value(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}
