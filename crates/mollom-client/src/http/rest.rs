//! REST transport.

use std::time::Duration;

use mollom_core::{AuthStamp, Credentials, Transport, TransportError, auth::oauth};
use mollom_proto::{Method, RequestEnvelope, rest};
use serde_json::Value as Json;

use super::{agent, complete, endpoint};

/// Sends form-encoded requests to `{server}/{version}/{resource}` and decodes
/// JSON replies.
///
/// The REST service sits behind a single load-balanced address, so the
/// "directory" is just the bootstrap server.
#[derive(Debug)]
pub struct RestTransport {
    agent: ureq::Agent,
    credentials: Credentials,
    version: String,
}

impl RestTransport {
    /// Transport signing with `credentials`, talking API `version`.
    pub fn new(credentials: Credentials, version: impl Into<String>, timeout: Duration) -> Self {
        Self { agent: agent(timeout), credentials, version: version.into() }
    }

    fn authorization(
        &self,
        envelope: &RequestEnvelope,
        url: &str,
        pairs: &[(String, String)],
        stamp: &AuthStamp,
    ) -> Option<String> {
        envelope.signed.then(|| {
            oauth::authorization_header(&self.credentials, envelope.method, url, pairs, stamp)
        })
    }
}

impl Transport for RestTransport {
    type Output = Json;

    fn round_trip(
        &self,
        server: &str,
        envelope: &RequestEnvelope,
        stamp: &AuthStamp,
    ) -> Result<Json, TransportError> {
        let url = endpoint(server, &self.version, &envelope.call);
        let pairs = envelope.params.to_form_pairs();

        let mut request = match envelope.method {
            Method::Get => self.agent.get(&url),
            Method::Post => self.agent.post(&url),
        }
        .set("Accept", "application/json");
        if let Some(header) = self.authorization(envelope, &url, &pairs, stamp) {
            request = request.set("Authorization", &header);
        }

        let result = match envelope.method {
            Method::Get => pairs.iter().fold(request, |r, (k, v)| r.query(k, v)).call(),
            Method::Post => {
                let form: Vec<(&str, &str)> =
                    pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
                request.send_form(&form)
            },
        };

        match complete(result, |status| (200..300).contains(&status)) {
            Ok(body) => Ok(rest::parse(&body)?),
            Err(TransportError::Protocol { status, reason, headers, body }) => {
                match rest::fault_in_body(&body) {
                    Some((code, message)) => Err(TransportError::fault(code, message)),
                    None => Err(TransportError::Protocol { status, reason, headers, body }),
                }
            },
            Err(other) => Err(other),
        }
    }

    fn fetch_servers(
        &self,
        bootstrap: &str,
        _stamp: &AuthStamp,
    ) -> Result<Vec<String>, TransportError> {
        Ok(vec![bootstrap.to_string()])
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use mollom_proto::Params;

    use super::*;
    use crate::http::test_server::{response, serve_once};

    fn transport() -> RestTransport {
        RestTransport::new(Credentials::new("pub", "priv"), "v1", Duration::from_secs(5))
    }

    fn stamp() -> AuthStamp {
        AuthStamp { time: Utc.with_ymd_and_hms(2012, 2, 8, 0, 0, 0).unwrap(), nonce: 9 }
    }

    #[test]
    fn directory_is_the_bootstrap() {
        assert_eq!(
            transport().fetch_servers("http://rest.mollom.com", &stamp()).unwrap(),
            vec!["http://rest.mollom.com"]
        );
    }

    #[test]
    fn post_sends_signed_form() {
        let (url, server) =
            serve_once(response("200 OK", "application/json", r#"{"content": {"id": "c1"}}"#));

        let envelope = RequestEnvelope::post("content", Params::new().with("postBody", "hi there"));
        let doc = transport().round_trip(&url, &envelope, &stamp()).unwrap();
        let request = server.join().unwrap();

        assert_eq!(doc["content"]["id"], "c1");
        assert!(request.starts_with("POST /v1/content HTTP/1.1"));
        assert!(request.contains("Authorization: OAuth oauth_consumer_key=\"pub\""));
        assert!(request.ends_with("postBody=hi+there") || request.ends_with("postBody=hi%20there"));
    }

    #[test]
    fn get_sends_query_and_unsigned_omits_header() {
        let (url, server) = serve_once(response("200 OK", "application/json", r#"{"list": []}"#));

        let envelope = RequestEnvelope::get("site", Params::new().with("offset", 0_i64)).unsigned();
        transport().round_trip(&url, &envelope, &stamp()).unwrap();
        let request = server.join().unwrap();

        assert!(request.starts_with("GET /v1/site?offset=0 HTTP/1.1"));
        assert!(!request.contains("Authorization"));
    }

    #[test]
    fn fault_body_becomes_fault() {
        let (url, server) = serve_once(response(
            "503 Service Unavailable",
            "application/json",
            r#"{"code": 1200, "message": "busy"}"#,
        ));

        let err = transport()
            .round_trip(&url, &RequestEnvelope::get("site", Params::new()), &stamp())
            .unwrap_err();
        server.join().unwrap();

        assert!(matches!(err, TransportError::Fault(f) if f.code == 1200));
    }

    #[test]
    fn plain_error_status_is_protocol_error() {
        let (url, server) = serve_once(response("404 Not Found", "text/plain", "no such captcha"));

        let err = transport()
            .round_trip(&url, &RequestEnvelope::post("captcha/x", Params::new()), &stamp())
            .unwrap_err();
        server.join().unwrap();

        assert!(matches!(
            err,
            TransportError::Protocol { status: 404, ref body, .. } if body == "no such captcha"
        ));
    }
}
