//! XML-RPC transport.

use std::time::Duration;

use mollom_core::{AuthStamp, Credentials, NonceSignature, Transport, TransportError};
use mollom_proto::{
    MethodResponse, Params, RequestEnvelope, Value,
    xmlrpc::{decode_response, encode_call, method_name},
};

use super::{agent, complete, endpoint};

/// POSTs `methodCall` documents to `{server}/{version}/`.
///
/// Only HTTP 200 carries a decodable reply; any other status is a protocol
/// error even if the body looks like XML-RPC.
#[derive(Debug)]
pub struct XmlRpcTransport {
    agent: ureq::Agent,
    credentials: Credentials,
    version: String,
}

impl XmlRpcTransport {
    /// Transport signing with `credentials`, talking API `version`.
    pub fn new(credentials: Credentials, version: impl Into<String>, timeout: Duration) -> Self {
        Self { agent: agent(timeout), credentials, version: version.into() }
    }

    /// Request body for one attempt.
    pub(crate) fn encode_request(&self, envelope: &RequestEnvelope, stamp: &AuthStamp) -> String {
        let mut params = envelope.params.clone();
        if envelope.signed {
            NonceSignature::sign(&self.credentials, stamp).merge_into(&mut params);
        }
        encode_call(&method_name(&envelope.call), &[params.into_value()])
    }
}

impl Transport for XmlRpcTransport {
    type Output = Value;

    fn round_trip(
        &self,
        server: &str,
        envelope: &RequestEnvelope,
        stamp: &AuthStamp,
    ) -> Result<Value, TransportError> {
        let url = endpoint(server, &self.version, "");
        let body = self.encode_request(envelope, stamp);

        let result = self.agent.post(&url).set("Content-Type", "text/xml").send_string(&body);
        let text = complete(result, |status| status == 200)?;

        match decode_response(&text)? {
            MethodResponse::Success(value) => Ok(value),
            MethodResponse::Fault { code, message } => Err(TransportError::fault(code, message)),
        }
    }

    fn fetch_servers(
        &self,
        bootstrap: &str,
        stamp: &AuthStamp,
    ) -> Result<Vec<String>, TransportError> {
        let envelope = RequestEnvelope::rpc("getServerList", Params::new());
        let value = self.round_trip(bootstrap, &envelope, stamp)?;
        server_list(&value)
    }
}

fn server_list(value: &Value) -> Result<Vec<String>, TransportError> {
    let invalid =
        || TransportError::Decode { reason: "server list is not an array of strings".into() };
    value
        .as_array()
        .ok_or_else(invalid)?
        .iter()
        .map(|server| server.as_str().map(ToString::to_string).ok_or_else(invalid))
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use mollom_proto::xmlrpc::decode_call;

    use super::*;
    use crate::http::test_server::{response, serve_once};

    fn transport() -> XmlRpcTransport {
        XmlRpcTransport::new(Credentials::new("pub", "priv"), "1.0", Duration::from_secs(5))
    }

    fn stamp() -> AuthStamp {
        AuthStamp { time: Utc.with_ymd_and_hms(2012, 2, 8, 0, 0, 0).unwrap(), nonce: 9 }
    }

    #[test]
    fn signed_request_carries_auth_fields() {
        let envelope =
            RequestEnvelope::rpc("checkContent", Params::new().with("post_body", "hello"));
        let body = transport().encode_request(&envelope, &stamp());
        let (method, params) = decode_call(&body).unwrap();

        assert_eq!(method, "mollom.checkContent");
        let args = &params[0];
        assert_eq!(args.str_member("post_body").unwrap(), "hello");
        assert_eq!(args.str_member("public_key").unwrap(), "pub");
        assert_eq!(args.str_member("nonce").unwrap(), "9");
        assert_eq!(args.str_member("time").unwrap(), "2012-02-08T00:00:00.000+0000");
        assert!(args.get("hash").is_some());
        assert!(args.get("private_key").is_none());
    }

    #[test]
    fn server_list_requires_strings() {
        assert_eq!(
            server_list(&Value::from(vec!["http://a", "http://b"])).unwrap(),
            vec!["http://a", "http://b"]
        );
        assert!(matches!(server_list(&Value::Int(3)), Err(TransportError::Decode { .. })));
    }

    #[test]
    fn posts_to_versioned_endpoint_and_decodes_reply() {
        let reply = "<methodResponse><params><param>\
            <value><boolean>1</boolean></value>\
            </param></params></methodResponse>";
        let (url, server) = serve_once(response("200 OK", "text/xml", reply));

        let envelope = RequestEnvelope::rpc("verifyKey", Params::new());
        let value = transport().round_trip(&url, &envelope, &stamp()).unwrap();
        let request = server.join().unwrap();

        assert_eq!(value, Value::Bool(true));
        assert!(request.starts_with("POST /1.0/ HTTP/1.1"));
        assert!(request.contains("<methodName>mollom.verifyKey</methodName>"));
    }

    #[test]
    fn fault_reply_becomes_fault() {
        let reply = "<methodResponse><fault><value><struct>\
            <member><name>faultCode</name><value><int>1200</int></value></member>\
            <member><name>faultString</name><value>busy</value></member>\
            </struct></value></fault></methodResponse>";
        let (url, server) = serve_once(response("200 OK", "text/xml", reply));

        let err = transport()
            .round_trip(&url, &RequestEnvelope::rpc("verifyKey", Params::new()), &stamp())
            .unwrap_err();
        server.join().unwrap();

        assert!(matches!(err, TransportError::Fault(f) if f.code == 1200 && f.message == "busy"));
    }

    #[test]
    fn non_200_is_protocol_error_even_with_xml_body() {
        let reply =
            "<methodResponse><params><param><value>ok</value></param></params></methodResponse>";
        let (url, server) = serve_once(response("202 Accepted", "text/xml", reply));

        let err = transport()
            .round_trip(&url, &RequestEnvelope::rpc("verifyKey", Params::new()), &stamp())
            .unwrap_err();
        server.join().unwrap();

        assert!(matches!(err, TransportError::Protocol { status: 202, .. }));
    }

    #[test]
    fn refused_connection_is_network_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let err = transport()
            .round_trip(&url, &RequestEnvelope::rpc("verifyKey", Params::new()), &stamp())
            .unwrap_err();
        assert!(matches!(err, TransportError::Network { .. }));
    }
}
