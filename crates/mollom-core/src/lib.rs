//! Mollom Client Core
//!
//! Sans-IO logic for talking to Mollom: no sockets and no system clock. The
//! production runtime in `mollom-client` and the simulation harness plug in
//! their own [`Environment`] and [`Transport`].
//!
//! # Architecture
//!
//! ```text
//! API call ──> RequestEnvelope ──> Dispatcher ──> Transport ──> server
//!                                     │
//!                                     ├── ServerDirectory (cached, expiring)
//!                                     └── AuthStamp (fresh per attempt)
//! ```
//!
//! # Components
//!
//! - [`env`]: clock and randomness
//! - [`auth`]: credential handling, nonce signatures and OAuth headers
//! - [`directory`]: server list cache with expiry and bounded refresh
//! - [`transport`]: the seam between dispatch and the network
//! - [`dispatcher`]: retry, failover and refresh for one call
//! - [`error`]: the error taxonomy every call resolves to

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod auth;
pub mod directory;
pub mod dispatcher;
pub mod env;
pub mod error;
pub mod transport;

pub use auth::{AuthStamp, Credentials, NonceSignature, REDACTED};
pub use directory::{
    CacheKey, DirectoryCache, DirectoryConfig, DirectoryEntry, DirectorySource,
    MemoryDirectoryCache, Resolved, ServerDirectory,
};
pub use dispatcher::{Dispatched, Dispatcher};
pub use env::Environment;
pub use error::{ErrorReason, MollomError, Resource};
pub use transport::{Fault, Transport, TransportError};
