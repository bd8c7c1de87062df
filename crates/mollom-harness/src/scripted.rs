//! Scripted transport.
//!
//! Replies are queued per server ahead of time; every contact is logged so
//! tests can assert on the exact order servers were tried.

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use mollom_core::{AuthStamp, Transport, TransportError};
use mollom_proto::{Params, RequestEnvelope};

/// One observed transport use.
#[derive(Debug, Clone, PartialEq)]
pub enum Contact {
    /// A call was sent to a server.
    Call {
        /// Server contacted.
        server: String,
        /// Call name or resource path.
        call: String,
        /// Arguments, without authentication fields.
        params: Params,
        /// Nonce the attempt was stamped with.
        nonce: u64,
    },
    /// A server list was requested.
    Directory {
        /// Bootstrap asked.
        bootstrap: String,
    },
}

impl Contact {
    /// Server or bootstrap contacted.
    pub fn server(&self) -> &str {
        match self {
            Self::Call { server, .. } => server,
            Self::Directory { bootstrap } => bootstrap,
        }
    }

    /// Returns true for directory requests.
    pub fn is_directory(&self) -> bool {
        matches!(self, Self::Directory { .. })
    }
}

struct Script<O> {
    replies: HashMap<String, VecDeque<Result<O, TransportError>>>,
    lists: HashMap<String, VecDeque<Result<Vec<String>, TransportError>>>,
    log: Vec<Contact>,
}

/// Transport answering from per-server queues.
///
/// A server with an empty queue is unreachable. Clones share the script and
/// the log.
pub struct ScriptedTransport<O> {
    script: Arc<Mutex<Script<O>>>,
}

impl<O> Clone for ScriptedTransport<O> {
    fn clone(&self) -> Self {
        Self { script: Arc::clone(&self.script) }
    }
}

impl<O> Default for ScriptedTransport<O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O> ScriptedTransport<O> {
    /// Transport with nothing scripted.
    pub fn new() -> Self {
        Self {
            script: Arc::new(Mutex::new(Script {
                replies: HashMap::new(),
                lists: HashMap::new(),
                log: Vec::new(),
            })),
        }
    }

    fn script(&self) -> MutexGuard<'_, Script<O>> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue a reply from `server`.
    pub fn reply(&self, server: &str, reply: Result<O, TransportError>) -> &Self {
        self.script().replies.entry(server.to_string()).or_default().push_back(reply);
        self
    }

    /// Queue a fault from `server`.
    pub fn fault(&self, server: &str, code: i32) -> &Self {
        self.reply(server, Err(TransportError::fault(code, format!("scripted fault {code}"))))
    }

    /// Queue a server list answered by `bootstrap`.
    pub fn server_list(&self, bootstrap: &str, servers: &[&str]) -> &Self {
        let list = servers.iter().map(ToString::to_string).collect();
        self.script().lists.entry(bootstrap.to_string()).or_default().push_back(Ok(list));
        self
    }

    /// Queue a failed server list request to `bootstrap`.
    pub fn server_list_error(&self, bootstrap: &str, error: TransportError) -> &Self {
        self.script().lists.entry(bootstrap.to_string()).or_default().push_back(Err(error));
        self
    }

    /// Everything contacted so far, in order.
    pub fn log(&self) -> Vec<Contact> {
        self.script().log.clone()
    }

    /// Servers that received calls, in order.
    pub fn call_servers(&self) -> Vec<String> {
        self.script()
            .log
            .iter()
            .filter(|c| !c.is_directory())
            .map(|c| c.server().to_string())
            .collect()
    }

    /// Calls made, as `(call, params)` pairs in order.
    pub fn calls(&self) -> Vec<(String, Params)> {
        self.script()
            .log
            .iter()
            .filter_map(|c| match c {
                Contact::Call { call, params, .. } => Some((call.clone(), params.clone())),
                Contact::Directory { .. } => None,
            })
            .collect()
    }

    /// Number of server list requests made.
    pub fn directory_requests(&self) -> usize {
        self.script().log.iter().filter(|c| c.is_directory()).count()
    }

    /// Replies still queued for `server`.
    pub fn pending(&self, server: &str) -> usize {
        self.script().replies.get(server).map_or(0, VecDeque::len)
    }
}

fn unreachable(server: &str) -> TransportError {
    TransportError::Network { reason: format!("{server}: connection refused") }
}

impl<O: Send> Transport for ScriptedTransport<O> {
    type Output = O;

    fn round_trip(
        &self,
        server: &str,
        envelope: &RequestEnvelope,
        stamp: &AuthStamp,
    ) -> Result<O, TransportError> {
        let mut script = self.script();
        script.log.push(Contact::Call {
            server: server.to_string(),
            call: envelope.call.clone(),
            params: envelope.params.clone(),
            nonce: stamp.nonce,
        });
        script
            .replies
            .get_mut(server)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| Err(unreachable(server)))
    }

    fn fetch_servers(
        &self,
        bootstrap: &str,
        _stamp: &AuthStamp,
    ) -> Result<Vec<String>, TransportError> {
        let mut script = self.script();
        script.log.push(Contact::Directory { bootstrap: bootstrap.to_string() });
        script
            .lists
            .get_mut(bootstrap)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| Err(unreachable(bootstrap)))
    }
}
