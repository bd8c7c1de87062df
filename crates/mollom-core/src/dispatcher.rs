//! Call dispatcher.
//!
//! Delivers one [`RequestEnvelope`] to one of the directory's servers.
//!
//! # Algorithm
//!
//! ```text
//!        ┌──────────────────────────────────────────────┐
//!        v                                              │
//! SelectingServer ──> Attempting ──ok──> Succeeded      │
//!        ^                │                             │
//!        │   busy/error/  │ refresh required,           │
//!        │   network      │ or candidates exhausted     │
//!        └────────────────┤                             │
//!                         v                             │
//!                    Refreshing ──non-empty list, depth+1┘
//!                         │
//!                         └──depth > max_retries──> ExhaustedFailure
//! ```
//!
//! # Invariants
//!
//! - Refreshing is the only way back to the start, and each pass increments
//!   `depth`. The loop ends once `depth > max_retries`.
//! - Every attempt is stamped afresh: no nonce is sent twice.
//! - HTTP errors and undecodable replies end the call immediately. Retrying
//!   them on another server would repeat the same rejection.

use std::sync::Arc;

use mollom_proto::{FaultKind, RequestEnvelope};

use crate::{
    auth::AuthStamp,
    directory::{DirectoryCache, Resolved, ServerDirectory},
    env::Environment,
    error::MollomError,
    transport::{Transport, TransportError},
};

/// A successful call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatched<T> {
    /// Decoded payload.
    pub value: T,
    /// Server that answered.
    pub server: String,
    /// Directory refreshes that restarted the call.
    pub retries: u32,
}

/// Retry and failover for calls over one transport.
pub struct Dispatcher<E, T, C> {
    env: E,
    transport: T,
    directory: Arc<ServerDirectory<C>>,
    max_retries: u32,
}

impl<E, T, C> Dispatcher<E, T, C>
where
    E: Environment,
    T: Transport,
    C: DirectoryCache,
{
    /// Dispatcher allowing up to `max_retries` restarts per call.
    pub fn new(env: E, transport: T, directory: Arc<ServerDirectory<C>>, max_retries: u32) -> Self {
        Self { env, transport, directory, max_retries }
    }

    /// Environment in use.
    pub fn env(&self) -> &E {
        &self.env
    }

    /// Transport in use.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Shared server directory.
    pub fn directory(&self) -> &Arc<ServerDirectory<C>> {
        &self.directory
    }

    /// Restart bound.
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Resolve the server list, fetching through this dispatcher's transport
    /// when needed.
    pub fn servers(&self, force: bool) -> Resolved {
        self.directory.get_servers(self.env.now(), force, |bootstrap| {
            let stamp = AuthStamp::issue(&self.env);
            self.transport.fetch_servers(bootstrap, &stamp)
        })
    }

    /// Deliver `envelope`, failing over and refreshing as faults dictate.
    pub fn invoke(&self, envelope: &RequestEnvelope) -> Result<Dispatched<T::Output>, MollomError> {
        let mut depth = 0u32;
        let mut attempts = 0u32;
        let mut last_failure: Option<String> = None;
        let mut refreshed: Option<Vec<String>> = None;

        loop {
            if depth > self.max_retries {
                tracing::warn!(call = %envelope.call, attempts, "retries exhausted");
                return Err(MollomError::Exhausted { attempts, last_failure });
            }

            let servers = match refreshed.take() {
                Some(servers) => servers,
                None => self.servers(false).servers,
            };
            if servers.is_empty() {
                return Err(MollomError::Exhausted { attempts, last_failure });
            }

            let mut restart = None;
            for server in &servers {
                attempts = attempts.saturating_add(1);
                let stamp = AuthStamp::issue(&self.env);
                tracing::debug!(call = %envelope.call, %server, depth, "attempting call");

                let fault = match self.transport.round_trip(server, envelope, &stamp) {
                    Ok(value) => {
                        tracing::debug!(
                            call = %envelope.call,
                            %server,
                            retries = depth,
                            "call succeeded"
                        );
                        return Ok(Dispatched { value, server: server.clone(), retries: depth });
                    },
                    Err(TransportError::Fault(fault)) => fault,
                    Err(TransportError::Network { reason }) => {
                        tracing::warn!(%server, %reason, "server unreachable, trying next");
                        last_failure = Some(format!("{server}: {reason}"));
                        continue;
                    },
                    Err(
                        err @ (TransportError::Protocol { .. } | TransportError::Decode { .. }),
                    ) => {
                        tracing::debug!(%server, error = %err, "call rejected");
                        return Err(err.into());
                    },
                };

                last_failure = Some(format!("{server}: fault {}: {}", fault.code, fault.message));
                match fault.kind() {
                    FaultKind::RefreshRequired => {
                        tracing::warn!(%server, "server list out of date, refreshing");
                        let fresh = self.servers(true).servers;
                        if !fresh.is_empty() {
                            restart = Some(fresh);
                            break;
                        }
                    },
                    FaultKind::ServerBusy => {
                        tracing::warn!(%server, "server busy, trying next");
                    },
                    FaultKind::InternalError | FaultKind::Other => {
                        tracing::warn!(%server, code = fault.code, "server fault, trying next");
                    },
                }
            }

            if let Some(fresh) = restart {
                refreshed = Some(fresh);
                depth += 1;
                continue;
            }

            // Every candidate failed. A refresh only helps if a restart is
            // still allowed afterwards.
            if depth >= self.max_retries {
                tracing::warn!(call = %envelope.call, attempts, "all servers failed");
                return Err(MollomError::Exhausted { attempts, last_failure });
            }
            let fresh = self.servers(true).servers;
            if fresh.is_empty() {
                return Err(MollomError::Exhausted { attempts, last_failure });
            }
            refreshed = Some(fresh);
            depth += 1;
        }
    }
}
