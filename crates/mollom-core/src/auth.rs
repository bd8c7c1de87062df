//! Request authentication.
//!
//! Mollom has two signing schemes, one per transport:
//!
//! - XML-RPC calls carry a [`NonceSignature`] inside the argument struct:
//!   `hash = base64(HMAC-SHA1(private_key, "time:nonce:private_key"))`.
//! - REST calls carry an OAuth 1.0 `Authorization` header signed with
//!   HMAC-SHA1, the public key as consumer key and the private key as
//!   consumer secret (see [`oauth`]).
//!
//! Both are pure functions of the credentials and an [`AuthStamp`]. The stamp
//! is drawn from the [`Environment`] once per attempt, so a retried call never
//! reuses a nonce.
//!
//! # Security
//!
//! The private key never leaves this module except as an HMAC key. `Debug`
//! output of every type here redacts it, and the computed hash as well.

use std::fmt;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use mollom_proto::Params;
use sha1::{Digest, Sha1};

use crate::env::Environment;

type HmacSha1 = Hmac<Sha1>;

/// Wire format of the `time` field. Always rendered in UTC.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S.000+0000";

/// Stand-in for secrets in `Debug` output.
pub const REDACTED: &str = "[REDACTED]";

/// A Mollom key pair. Immutable once built.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    public_key: String,
    private_key: String,
}

impl Credentials {
    /// Build from a key pair.
    pub fn new(public_key: impl Into<String>, private_key: impl Into<String>) -> Self {
        Self { public_key: public_key.into(), private_key: private_key.into() }
    }

    /// The public key. Safe to transmit and log.
    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    pub(crate) fn private_key(&self) -> &str {
        &self.private_key
    }

    /// Hex SHA-1 of the key pair. Identifies the pair in cache keys without
    /// exposing the private key.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha1::new();
        hasher.update(self.public_key.as_bytes());
        hasher.update(b":");
        hasher.update(self.private_key.as_bytes());
        hex::encode(hasher.finalize())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("public_key", &self.public_key)
            .field("private_key", &REDACTED)
            .finish()
    }
}

/// Time and nonce for one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthStamp {
    /// Signing time.
    pub time: DateTime<Utc>,
    /// 64-bit random nonce.
    pub nonce: u64,
}

impl AuthStamp {
    /// Draw a fresh stamp from the environment.
    pub fn issue<E: Environment>(env: &E) -> Self {
        Self { time: env.now(), nonce: env.random_u64() }
    }

    /// `time` field as sent on the wire.
    pub fn timestamp(&self) -> String {
        self.time.format(TIMESTAMP_FORMAT).to_string()
    }
}

/// The four authentication fields of an XML-RPC call.
#[derive(Clone, PartialEq, Eq)]
pub struct NonceSignature {
    /// Caller's public key.
    pub public_key: String,
    /// Formatted timestamp.
    pub time: String,
    /// Base64 HMAC-SHA1.
    pub hash: String,
    /// Decimal nonce.
    pub nonce: String,
}

impl NonceSignature {
    /// Sign a stamp.
    pub fn sign(credentials: &Credentials, stamp: &AuthStamp) -> Self {
        let time = stamp.timestamp();
        let nonce = stamp.nonce.to_string();
        let message = format!("{time}:{nonce}:{}", credentials.private_key());
        let digest = hmac_sha1(credentials.private_key().as_bytes(), message.as_bytes());

        Self {
            public_key: credentials.public_key().to_string(),
            time,
            hash: STANDARD.encode(digest),
            nonce,
        }
    }

    /// Add the signature fields to a call's arguments, replacing any caller
    /// supplied values of the same name.
    pub fn merge_into(self, params: &mut Params) {
        params.insert("public_key", self.public_key);
        params.insert("time", self.time);
        params.insert("hash", self.hash);
        params.insert("nonce", self.nonce);
    }
}

impl fmt::Debug for NonceSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NonceSignature")
            .field("public_key", &self.public_key)
            .field("time", &self.time)
            .field("hash", &REDACTED)
            .field("nonce", &self.nonce)
            .finish()
    }
}

#[allow(clippy::expect_used)]
fn hmac_sha1(key: &[u8], data: &[u8]) -> [u8; 20] {
    // HMAC pads or hashes keys of any length; only fixed-size MACs reject them.
    let mut mac = HmacSha1::new_from_slice(key).expect("invariant: HMAC accepts any key length");
    mac.update(data);
    mac.finalize().into_bytes().into()
}

/// OAuth 1.0 consumer signatures (RFC 5849, HMAC-SHA1, no token).
pub mod oauth {
    use base64::{Engine as _, engine::general_purpose::STANDARD};
    use mollom_proto::Method;

    use super::{AuthStamp, Credentials, hmac_sha1};

    /// RFC 3986 percent-encoding: everything but `ALPHA / DIGIT / - . _ ~`.
    pub fn percent_encode(input: &str) -> String {
        urlencoding::encode(input).into_owned()
    }

    /// The `oauth_*` protocol parameters for a stamp, without the signature.
    pub fn protocol_params(credentials: &Credentials, stamp: &AuthStamp) -> Vec<(String, String)> {
        vec![
            ("oauth_consumer_key".to_string(), credentials.public_key().to_string()),
            ("oauth_nonce".to_string(), format!("{:016x}", stamp.nonce)),
            ("oauth_signature_method".to_string(), "HMAC-SHA1".to_string()),
            ("oauth_timestamp".to_string(), stamp.time.timestamp().to_string()),
            ("oauth_version".to_string(), "1.0".to_string()),
        ]
    }

    /// Signature base string (RFC 5849 section 3.4.1).
    ///
    /// `url` must not contain a query string; query parameters belong in
    /// `params` along with form body parameters and the protocol parameters.
    pub fn signature_base_string(method: Method, url: &str, params: &[(String, String)]) -> String {
        let mut encoded: Vec<(String, String)> =
            params.iter().map(|(k, v)| (percent_encode(k), percent_encode(v))).collect();
        encoded.sort();
        let normalized =
            encoded.iter().map(|(k, v)| format!("{k}={v}")).collect::<Vec<_>>().join("&");

        format!("{}&{}&{}", method.as_str(), percent_encode(url), percent_encode(&normalized))
    }

    /// Value for the `Authorization` header of one request.
    pub fn authorization_header(
        credentials: &Credentials,
        method: Method,
        url: &str,
        request_params: &[(String, String)],
        stamp: &AuthStamp,
    ) -> String {
        let protocol = protocol_params(credentials, stamp);
        let mut all = protocol.clone();
        all.extend_from_slice(request_params);

        let base = signature_base_string(method, url, &all);
        // Empty token secret: the key is "consumer_secret&".
        let key = format!("{}&", percent_encode(credentials.private_key()));
        let signature = STANDARD.encode(hmac_sha1(key.as_bytes(), base.as_bytes()));

        let mut fields: Vec<String> =
            protocol.iter().map(|(k, v)| format!("{k}=\"{}\"", percent_encode(v))).collect();
        fields.push(format!("oauth_signature=\"{}\"", percent_encode(&signature)));
        format!("OAuth {}", fields.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::env::fixed::FixedEnv;

    fn creds() -> Credentials {
        Credentials::new("pub-key", "priv-key")
    }

    fn stamp() -> AuthStamp {
        AuthStamp { time: Utc.with_ymd_and_hms(2012, 2, 8, 13, 5, 9).unwrap(), nonce: 42 }
    }

    #[test]
    fn hmac_sha1_matches_rfc2202() {
        let digest = hmac_sha1(b"Jefe", b"what do ya want for nothing?");
        assert_eq!(hex::encode(digest), "effcdf6ae5eb2fa2d27416d5f184df9c259a7c79");
    }

    #[test]
    fn hmac_sha1_accepts_empty_and_oversized_keys() {
        let message = b"Test Using Larger Than Block-Size Key - Hash Key First";
        let digest = hmac_sha1(&[0xaa; 80], message);
        assert_eq!(hex::encode(digest), "aa4ae5e15272d00e95705637ce8a3b55ed402112");

        let digest = hmac_sha1(b"", b"");
        assert_eq!(hex::encode(digest), "fbdb1d1b18aa6c08324b7d64b71fb76370690e1d");
    }

    #[test]
    fn timestamp_is_utc_with_fixed_suffix() {
        assert_eq!(stamp().timestamp(), "2012-02-08T13:05:09.000+0000");
    }

    #[test]
    fn nonce_signature_matches_manual_hmac() {
        let sig = NonceSignature::sign(&creds(), &stamp());
        let expected = STANDARD
            .encode(hmac_sha1(b"priv-key", b"2012-02-08T13:05:09.000+0000:42:priv-key"));

        assert_eq!(sig.public_key, "pub-key");
        assert_eq!(sig.nonce, "42");
        assert_eq!(sig.hash, expected);
    }

    #[test]
    fn merge_adds_auth_fields() {
        let mut params = Params::new().with("post_body", "hi");
        NonceSignature::sign(&creds(), &stamp()).merge_into(&mut params);

        for key in ["public_key", "time", "hash", "nonce", "post_body"] {
            assert!(params.contains_key(key), "missing {key}");
        }
        assert_eq!(params.len(), 5);
    }

    #[test]
    fn issued_stamps_differ() {
        let env = FixedEnv::at(1_328_706_309);
        let a = AuthStamp::issue(&env);
        let b = AuthStamp::issue(&env);
        assert_eq!(a.time, b.time);
        assert_ne!(a.nonce, b.nonce);
    }

    #[test]
    fn debug_redacts_secrets() {
        let creds_dbg = format!("{:?}", creds());
        assert!(creds_dbg.contains("pub-key"));
        assert!(!creds_dbg.contains("priv-key"));
        assert!(creds_dbg.contains(REDACTED));

        let sig = NonceSignature::sign(&creds(), &stamp());
        let sig_dbg = format!("{sig:?}");
        assert!(!sig_dbg.contains(&sig.hash));
    }

    #[test]
    fn fingerprint_hides_private_key() {
        let fp = creds().fingerprint();
        assert_eq!(fp.len(), 40);
        assert!(!fp.contains("priv"));
        assert_ne!(fp, Credentials::new("pub-key", "other").fingerprint());
    }

    #[test]
    fn percent_encoding_is_rfc3986() {
        assert_eq!(oauth::percent_encode("Ladies + Gentlemen"), "Ladies%20%2B%20Gentlemen");
        assert_eq!(oauth::percent_encode("a-b._~"), "a-b._~");
    }

    #[test]
    fn base_string_sorts_encoded_params() {
        let params = vec![
            ("b".to_string(), "2".to_string()),
            ("a".to_string(), "x y".to_string()),
            ("a".to_string(), "1".to_string()),
        ];
        let base = oauth::signature_base_string(
            mollom_proto::Method::Get,
            "http://rest.mollom.com/v1/site",
            &params,
        );
        let url = "http%3A%2F%2Frest.mollom.com%2Fv1%2Fsite";
        let query = "a%3D1%26a%3Dx%2520y%26b%3D2";
        assert_eq!(base, format!("GET&{url}&{query}"));
    }

    #[test]
    fn authorization_header_is_deterministic_per_stamp() {
        let url = "http://rest.mollom.com/v1/content";
        let body = vec![("postBody".to_string(), "hello".to_string())];
        let h1 =
            oauth::authorization_header(&creds(), mollom_proto::Method::Post, url, &body, &stamp());
        let h2 =
            oauth::authorization_header(&creds(), mollom_proto::Method::Post, url, &body, &stamp());

        assert_eq!(h1, h2);
        assert!(h1.starts_with("OAuth oauth_consumer_key=\"pub-key\""));
        assert!(h1.contains("oauth_timestamp=\"1328706309\""));
        assert!(h1.contains("oauth_signature=\""));
        assert!(!h1.contains("priv-key"));
    }
}
