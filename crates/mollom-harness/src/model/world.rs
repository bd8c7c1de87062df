//! Model world.
//!
//! A straight-line restatement of the dispatch rules over plain queues. It
//! is the oracle the real dispatcher is checked against.

use std::collections::VecDeque;

use super::operation::{ModelOutcome, Operation, Reply, SERVER_COUNT, ServerId, server_url};

/// Observable state for oracle comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservableState {
    /// Servers that received calls, in order.
    pub calls: Vec<String>,
    /// Server list requests made to the bootstrap.
    pub directory_requests: usize,
}

/// Reference dispatcher, directory and network in one.
#[derive(Debug, Clone)]
pub struct ModelWorld {
    max_retries: u32,
    timeout_hours: u64,
    now_hours: u64,
    cache: Option<(Vec<String>, u64)>,
    replies: Vec<VecDeque<Reply>>,
    lists: VecDeque<Vec<String>>,
    calls: Vec<String>,
    directory_requests: usize,
}

impl ModelWorld {
    /// World whose dispatcher allows `max_retries` restarts and whose lists
    /// expire after `timeout_hours`.
    pub fn new(max_retries: u32, timeout_hours: u64) -> Self {
        Self {
            max_retries,
            timeout_hours,
            now_hours: 0,
            cache: None,
            replies: vec![VecDeque::new(); usize::from(SERVER_COUNT)],
            lists: VecDeque::new(),
            calls: Vec::new(),
            directory_requests: 0,
        }
    }

    /// Apply an operation and return the result.
    pub fn apply(&mut self, op: &Operation) -> ModelOutcome {
        match op {
            Operation::QueueReply { server, reply } => {
                self.replies[usize::from(server % SERVER_COUNT)].push_back(*reply);
                ModelOutcome::Done
            },
            Operation::QueueList { servers } => {
                self.lists.push_back(servers.iter().map(|s| server_url(*s)).collect());
                ModelOutcome::Done
            },
            Operation::AdvanceTime { hours } => {
                self.now_hours += u64::from(*hours);
                ModelOutcome::Done
            },
            Operation::Invoke => self.invoke(),
        }
    }

    /// Extract observable state for comparison.
    pub fn observable_state(&self) -> ObservableState {
        ObservableState { calls: self.calls.clone(), directory_requests: self.directory_requests }
    }

    fn servers(&mut self, force: bool) -> Vec<String> {
        if !force
            && let Some((servers, cached_at)) = &self.cache
            && self.now_hours < cached_at + self.timeout_hours
        {
            return servers.clone();
        }

        self.directory_requests += 1;
        match self.lists.pop_front() {
            Some(servers) if !servers.is_empty() => {
                self.cache = Some((servers.clone(), self.now_hours));
                servers
            },
            // No fallback servers are configured.
            _ => Vec::new(),
        }
    }

    fn reply(&mut self, server: &str) -> Reply {
        let index = (0..SERVER_COUNT).position(|id| server_url(id) == server);
        index.and_then(|i| self.replies[i].pop_front()).unwrap_or(Reply::Unreachable)
    }

    fn invoke(&mut self) -> ModelOutcome {
        let mut depth = 0;
        let mut attempts = 0;
        let mut refreshed: Option<Vec<String>> = None;

        loop {
            if depth > self.max_retries {
                return ModelOutcome::Exhausted { attempts };
            }
            let servers = match refreshed.take() {
                Some(servers) => servers,
                None => self.servers(false),
            };
            if servers.is_empty() {
                return ModelOutcome::Exhausted { attempts };
            }

            let mut restart = None;
            for server in servers {
                attempts += 1;
                self.calls.push(server.clone());
                match self.reply(&server) {
                    Reply::Ok => return ModelOutcome::Succeeded { server, retries: depth },
                    Reply::Rejected => return ModelOutcome::Rejected { status: 403 },
                    Reply::RefreshRequired => {
                        let fresh = self.servers(true);
                        if !fresh.is_empty() {
                            restart = Some(fresh);
                            break;
                        }
                    },
                    Reply::Busy | Reply::InternalError | Reply::Unreachable => {},
                }
            }

            if let Some(fresh) = restart {
                refreshed = Some(fresh);
                depth += 1;
                continue;
            }
            if depth >= self.max_retries {
                return ModelOutcome::Exhausted { attempts };
            }
            let fresh = self.servers(true);
            if fresh.is_empty() {
                return ModelOutcome::Exhausted { attempts };
            }
            refreshed = Some(fresh);
            depth += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn busy_server_fails_over() {
        let mut world = ModelWorld::new(0, 24);
        world.apply(&Operation::QueueList { servers: vec![0, 1] });
        world.apply(&Operation::QueueReply { server: 0, reply: Reply::Busy });
        world.apply(&Operation::QueueReply { server: 1, reply: Reply::Ok });

        assert_eq!(
            world.apply(&Operation::Invoke),
            ModelOutcome::Succeeded { server: server_url(1), retries: 0 }
        );
        assert_eq!(world.observable_state().calls, vec![server_url(0), server_url(1)]);
    }

    #[test]
    fn cache_expires() {
        let mut world = ModelWorld::new(0, 24);
        world.apply(&Operation::QueueList { servers: vec![0] });
        world.apply(&Operation::Invoke);
        world.apply(&Operation::Invoke);
        assert_eq!(world.observable_state().directory_requests, 1);

        world.apply(&Operation::AdvanceTime { hours: 24 });
        world.apply(&Operation::Invoke);
        assert_eq!(world.observable_state().directory_requests, 2);
    }
}
