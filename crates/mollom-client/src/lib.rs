//! Mollom Client
//!
//! Blocking client for the Mollom content moderation service, over either
//! the legacy XML-RPC API ([`Mollom`]) or the REST API ([`MollomRest`]).
//!
//! # Components
//!
//! - [`config`]: TOML configuration with environment overrides
//! - [`http`]: `ureq` transports for both protocols
//! - [`rpc`]: XML-RPC calls and their typed replies
//! - [`rest`]: REST resources (content, CAPTCHA, feedback, blacklist,
//!   whitelist, site)
//! - [`FileDirectoryCache`]: server lists shared across processes
//! - [`SystemEnv`]: wall clock and OS entropy
//!
//! ```no_run
//! use mollom_client::{Mollom, MollomConfig, rpc::types::ContentSubmission};
//!
//! let config = MollomConfig::load("mollom.toml")?;
//! let mollom = Mollom::from_config(&config)?;
//! let check = mollom.check_content(&ContentSubmission {
//!     post_body: Some("Buy cheap watches".to_string()),
//!     ..ContentSubmission::default()
//! })?;
//! println!("{:?}", check.spam);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod config;
pub mod file_cache;
pub mod http;
pub mod rest;
pub mod rpc;
pub mod runtime;
pub mod system_env;

pub use config::{ConfigError, MollomConfig, TransportKind};
pub use file_cache::FileDirectoryCache;
pub use mollom_core::{ErrorReason, MollomError, Resource};
pub use rest::MollomRest;
pub use rpc::Mollom;
pub use system_env::SystemEnv;
