//! Blocking HTTP transports.
//!
//! One `ureq` request per attempt. The agent keeps no idle connections, so
//! every attempt opens a fresh connection to whichever server the dispatcher
//! picked.

mod rest;
mod rpc;

use std::time::Duration;

use mollom_core::TransportError;

pub use rest::RestTransport;
pub use rpc::XmlRpcTransport;

const USER_AGENT: &str = concat!("mollom-client/", env!("CARGO_PKG_VERSION"));

/// Agent with a per-request timeout and no connection pooling.
pub(crate) fn agent(timeout: Duration) -> ureq::Agent {
    ureq::AgentBuilder::new()
        .timeout(timeout)
        .max_idle_connections(0)
        .max_idle_connections_per_host(0)
        .user_agent(USER_AGENT)
        .build()
}

/// Join a server, a version and an optional path without doubled slashes.
pub(crate) fn endpoint(server: &str, version: &str, path: &str) -> String {
    let server = server.trim_end_matches('/');
    let version = version.trim_matches('/');
    let path = path.trim_start_matches('/');
    format!("{server}/{version}/{path}")
}

/// Read the body of an accepted response, or turn anything else into a
/// [`TransportError`].
pub(crate) fn complete(
    result: Result<ureq::Response, ureq::Error>,
    accept: impl Fn(u16) -> bool,
) -> Result<String, TransportError> {
    match result {
        Ok(response) if accept(response.status()) => response
            .into_string()
            .map_err(|e| TransportError::Network { reason: format!("reading body: {e}") }),
        Ok(response) | Err(ureq::Error::Status(_, response)) => Err(protocol_error(response)),
        Err(other) => Err(TransportError::Network { reason: other.to_string() }),
    }
}

fn protocol_error(response: ureq::Response) -> TransportError {
    let status = response.status();
    let reason = response.status_text().to_string();
    let headers = response
        .headers_names()
        .into_iter()
        .filter_map(|name| {
            let value = response.header(&name)?.to_string();
            Some((name, value))
        })
        .collect();
    let body = response.into_string().unwrap_or_default();
    TransportError::Protocol { status, reason, headers, body }
}


/// One-shot HTTP server for transport tests.
#[cfg(test)]
pub(crate) mod test_server {
    use std::{
        io::{Read as _, Write as _},
        net::TcpListener,
        thread::{self, JoinHandle},
    };

    /// Serve `response` (a full HTTP response) to the first connection and
    /// return the raw request that was received.
    pub(crate) fn serve_once(response: String) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());

        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut chunk = [0u8; 1024];
            loop {
                let n = stream.read(&mut chunk).unwrap();
                request.extend_from_slice(&chunk[..n]);
                if n == 0 || complete_request(&request) {
                    break;
                }
            }
            stream.write_all(response.as_bytes()).unwrap();
            String::from_utf8_lossy(&request).into_owned()
        });

        (url, handle)
    }

    /// Build a response with the given status line and body.
    pub(crate) fn response(status: &str, content_type: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {status}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\n\
             Connection: close\r\n\r\n{body}",
            body.len()
        )
    }

    fn complete_request(raw: &[u8]) -> bool {
        let text = String::from_utf8_lossy(raw);
        let Some(split) = text.find("\r\n\r\n") else {
            return false;
        };
        let length = text[..split]
            .lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse::<usize>().ok())
            .unwrap_or(0);
        raw.len() >= split + 4 + length
    }
}
