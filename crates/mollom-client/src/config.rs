//! Client configuration.
//!
//! Loaded from TOML. Every field has a default except the key pair, which
//! may instead come from `MOLLOM_PUBLIC_KEY` / `MOLLOM_PRIVATE_KEY`.
//!
//! ```toml
//! [general]
//! transport = "xmlrpc"
//! server = "http://xmlrpc.mollom.com"
//! max_retries = 5
//!
//! [authentication]
//! public_key = "..."
//! private_key = "..."
//!
//! [caching]
//! max_serverlist_days = 7
//! max_serverlist_hours = 0
//! ```

use std::{
    fmt, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use mollom_core::{
    Credentials, DirectoryConfig, MollomError, REDACTED,
    directory::{DEFAULT_BOOTSTRAP, FALLBACK_SERVERS},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable overriding `authentication.public_key`.
pub const PUBLIC_KEY_VAR: &str = "MOLLOM_PUBLIC_KEY";

/// Environment variable overriding `authentication.private_key`.
pub const PRIVATE_KEY_VAR: &str = "MOLLOM_PRIVATE_KEY";

/// Default REST endpoint.
pub const DEFAULT_REST_SERVER: &str = "http://rest.mollom.com";

/// Errors loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("cannot read {path}: {source}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The file is not valid TOML for this schema.
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// The values are unusable.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// What is wrong.
        reason: String,
    },
}

impl From<ConfigError> for MollomError {
    fn from(err: ConfigError) -> Self {
        Self::Config { reason: err.to_string() }
    }
}

/// Which protocol to speak.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Legacy XML-RPC with a server directory.
    #[default]
    XmlRpc,
    /// REST with OAuth signatures against a single endpoint.
    Rest,
}

/// Complete client configuration.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct MollomConfig {
    /// Endpoint and retry settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Key pair.
    #[serde(default)]
    pub authentication: AuthenticationConfig,

    /// Server list caching.
    #[serde(default)]
    pub caching: CachingConfig,
}

/// `[general]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Protocol (default: xmlrpc)
    #[serde(default)]
    pub transport: TransportKind,

    /// Bootstrap server (default depends on transport)
    #[serde(default)]
    pub server: Option<String>,

    /// API version path segment (default: 1.0 for XML-RPC, v1 for REST)
    #[serde(default)]
    pub version: Option<String>,

    /// Directory refreshes allowed per call (default: 5 for XML-RPC, 0 for
    /// REST)
    #[serde(default)]
    pub max_retries: Option<u32>,

    /// Per-request timeout in seconds (default: 20)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Servers used when no list can be fetched (default: the built-in
    /// XML-RPC servers, none for REST)
    #[serde(default)]
    pub fallback_servers: Option<Vec<String>>,
}

/// `[authentication]` section.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct AuthenticationConfig {
    /// Public key
    #[serde(default)]
    pub public_key: String,

    /// Private key
    #[serde(default)]
    pub private_key: String,
}

/// `[caching]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachingConfig {
    /// Days a server list stays valid (default: 7)
    #[serde(default = "default_serverlist_days")]
    pub max_serverlist_days: u64,

    /// Hours added to `max_serverlist_days` (default: 0)
    #[serde(default)]
    pub max_serverlist_hours: u64,

    /// Persist server lists to this file instead of memory
    #[serde(default)]
    pub cache_file: Option<PathBuf>,
}

fn default_timeout_secs() -> u64 {
    20
}

fn default_serverlist_days() -> u64 {
    7
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            transport: TransportKind::default(),
            server: None,
            version: None,
            max_retries: None,
            timeout_secs: default_timeout_secs(),
            fallback_servers: None,
        }
    }
}

impl Default for CachingConfig {
    fn default() -> Self {
        Self {
            max_serverlist_days: default_serverlist_days(),
            max_serverlist_hours: 0,
            cache_file: None,
        }
    }
}

impl MollomConfig {
    /// Defaults with the given keys.
    pub fn with_keys(public_key: impl Into<String>, private_key: impl Into<String>) -> Self {
        Self {
            authentication: AuthenticationConfig {
                public_key: public_key.into(),
                private_key: private_key.into(),
            },
            ..Self::default()
        }
    }

    /// Read `path`, apply environment overrides and validate.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        let mut config = Self::parse(&text)?;
        config.apply_overrides(|name| std::env::var(name).ok());
        config.validate()?;
        tracing::debug!(
            path = %path.display(),
            transport = ?config.general.transport,
            "configuration loaded"
        );
        Ok(config)
    }

    /// Parse TOML without validating.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Replace keys with non-empty values from `lookup`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup(PUBLIC_KEY_VAR).filter(|k| !k.is_empty()) {
            self.authentication.public_key = key;
        }
        if let Some(key) = lookup(PRIVATE_KEY_VAR).filter(|k| !k.is_empty()) {
            self.authentication.private_key = key;
        }
    }

    /// Reject configurations that cannot work.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: &str| Err(ConfigError::Invalid { reason: reason.to_string() });

        if self.authentication.public_key.trim().is_empty() {
            return invalid("authentication.public_key is empty");
        }
        if self.authentication.private_key.trim().is_empty() {
            return invalid("authentication.private_key is empty");
        }
        if self.general.timeout_secs == 0 {
            return invalid("general.timeout_secs must be positive");
        }
        if self.server().trim().is_empty() {
            return invalid("general.server is empty");
        }
        if self.version().trim().is_empty() {
            return invalid("general.version is empty");
        }
        Ok(())
    }

    /// Bootstrap server.
    pub fn server(&self) -> &str {
        match (&self.general.server, self.general.transport) {
            (Some(server), _) => server,
            (None, TransportKind::XmlRpc) => DEFAULT_BOOTSTRAP,
            (None, TransportKind::Rest) => DEFAULT_REST_SERVER,
        }
    }

    /// API version path segment.
    pub fn version(&self) -> &str {
        match (&self.general.version, self.general.transport) {
            (Some(version), _) => version,
            (None, TransportKind::XmlRpc) => "1.0",
            (None, TransportKind::Rest) => "v1",
        }
    }

    /// Directory refreshes allowed per call.
    pub fn max_retries(&self) -> u32 {
        self.general.max_retries.unwrap_or(match self.general.transport {
            TransportKind::XmlRpc => 5,
            TransportKind::Rest => 0,
        })
    }

    /// Per-request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.general.timeout_secs)
    }

    /// Key pair.
    pub fn credentials(&self) -> Credentials {
        Credentials::new(&self.authentication.public_key, &self.authentication.private_key)
    }

    /// Server directory settings.
    pub fn directory_config(&self) -> DirectoryConfig {
        let fallback = match (&self.general.fallback_servers, self.general.transport) {
            (Some(servers), _) => servers.clone(),
            (None, TransportKind::XmlRpc) => {
                FALLBACK_SERVERS.iter().map(ToString::to_string).collect()
            },
            (None, TransportKind::Rest) => Vec::new(),
        };
        DirectoryConfig {
            bootstrap: self.server().to_string(),
            fallback,
            timeout: DirectoryConfig::timeout_from(
                self.caching.max_serverlist_days,
                self.caching.max_serverlist_hours,
            ),
        }
    }
}

impl fmt::Debug for AuthenticationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthenticationConfig")
            .field("public_key", &self.public_key)
            .field("private_key", &REDACTED)
            .finish()
    }
}

impl fmt::Debug for MollomConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MollomConfig")
            .field("general", &self.general)
            .field("authentication", &self.authentication)
            .field("caching", &self.caching)
            .finish()
    }
}
