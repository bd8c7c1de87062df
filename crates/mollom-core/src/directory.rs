//! Server directory cache.
//!
//! Mollom runs several interchangeable servers and hands out their addresses
//! through `getServerList`. Clients cache that list for days and refresh it
//! when it expires or when a server tells them it is out of date.
//!
//! # Components
//!
//! - [`DirectoryEntry`]: one fetched list and when it was fetched
//! - [`DirectoryCache`]: pluggable storage keyed by [`CacheKey`]
//! - [`ServerDirectory`]: expiry, refresh and fallback policy over a cache
//!
//! # Invariants
//!
//! - A list is replaced wholesale on refresh, never merged.
//! - An empty list is never stored.
//! - The built-in fallback list is served for one attempt and never stored,
//!   so the next call tries the network again.
//! - At most one refresh runs per directory at a time. Non-forced callers that
//!   waited for a running refresh reuse its result.

use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use chrono::{DateTime, Utc};

use crate::{auth::Credentials, transport::TransportError};

/// Default bootstrap server for XML-RPC.
pub const DEFAULT_BOOTSTRAP: &str = "http://xmlrpc.mollom.com";

/// Servers used when no list can be fetched.
pub const FALLBACK_SERVERS: [&str; 3] =
    ["http://xmlrpc3.mollom.com", "http://xmlrpc2.mollom.com", "http://xmlrpc1.mollom.com"];

/// Default list lifetime: 7 days.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// A fetched server list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    /// Servers in priority order.
    pub servers: Vec<String>,
    /// When the list was fetched.
    pub cached_at: DateTime<Utc>,
}

impl DirectoryEntry {
    /// Returns true once `now` reaches `cached_at + timeout`.
    pub fn is_stale(&self, now: DateTime<Utc>, timeout: Duration) -> bool {
        let Ok(timeout) = chrono::Duration::from_std(timeout) else {
            return false;
        };
        self.cached_at.checked_add_signed(timeout).is_some_and(|expiry| now >= expiry)
    }
}

/// Identifies one credential pair's directory.
///
/// Built from the public key and a fingerprint of the pair, never from the
/// private key itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Key for a credential pair.
    pub fn for_credentials(credentials: &Credentials) -> Self {
        Self(format!("{}:{}", credentials.public_key(), credentials.fingerprint()))
    }

    /// String form, for caches that persist keys.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Storage for server lists.
///
/// Caches are best effort: a failing store is logged by the implementation
/// and the directory carries on with the list it fetched.
pub trait DirectoryCache: Send + Sync {
    /// Fetch the entry for `key`, if any.
    fn load(&self, key: &CacheKey) -> Option<DirectoryEntry>;

    /// Replace the entry for `key`.
    fn store(&self, key: &CacheKey, entry: DirectoryEntry);

    /// Remove the entry for `key`.
    fn evict(&self, key: &CacheKey);
}

/// Process-local cache.
#[derive(Debug, Default)]
pub struct MemoryDirectoryCache {
    entries: Mutex<HashMap<CacheKey, DirectoryEntry>>,
}

impl MemoryDirectoryCache {
    /// Empty cache.
    pub fn new() -> Self {
        Self::default()
    }
}

impl DirectoryCache for MemoryDirectoryCache {
    fn load(&self, key: &CacheKey) -> Option<DirectoryEntry> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).get(key).cloned()
    }

    fn store(&self, key: &CacheKey, entry: DirectoryEntry) {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).insert(key.clone(), entry);
    }

    fn evict(&self, key: &CacheKey) {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).remove(key);
    }
}

impl<C: DirectoryCache + ?Sized> DirectoryCache for Arc<C> {
    fn load(&self, key: &CacheKey) -> Option<DirectoryEntry> {
        (**self).load(key)
    }

    fn store(&self, key: &CacheKey, entry: DirectoryEntry) {
        (**self).store(key, entry);
    }

    fn evict(&self, key: &CacheKey) {
        (**self).evict(key);
    }
}

/// Where to find servers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryConfig {
    /// First server asked for a list.
    pub bootstrap: String,
    /// Tried as bootstraps when `bootstrap` fails, and served as-is when
    /// every bootstrap fails.
    pub fallback: Vec<String>,
    /// List lifetime.
    pub timeout: Duration,
}

impl DirectoryConfig {
    /// Lifetime from the `days` + `hours` pair used in configuration files.
    pub fn timeout_from(days: u64, hours: u64) -> Duration {
        Duration::from_secs(days.saturating_mul(24).saturating_add(hours).saturating_mul(3600))
    }
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            bootstrap: DEFAULT_BOOTSTRAP.to_string(),
            fallback: FALLBACK_SERVERS.iter().map(ToString::to_string).collect(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// How a list was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectorySource {
    /// Served from cache without network traffic.
    Cache,
    /// Freshly fetched and stored.
    Remote,
    /// Built-in list; nothing fetched, nothing stored.
    Fallback,
}

/// Result of a directory lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    /// Servers in priority order. Empty only if the fallback list is empty.
    pub servers: Vec<String>,
    /// How the list was obtained.
    pub source: DirectorySource,
}

/// Expiring server list for one credential pair.
pub struct ServerDirectory<C> {
    cache: C,
    key: CacheKey,
    config: DirectoryConfig,
    refresh_lock: Mutex<()>,
}

impl<C: DirectoryCache> ServerDirectory<C> {
    /// Directory over `cache` for the given credentials.
    pub fn new(cache: C, credentials: &Credentials, config: DirectoryConfig) -> Self {
        Self {
            cache,
            key: CacheKey::for_credentials(credentials),
            config,
            refresh_lock: Mutex::new(()),
        }
    }

    /// Configuration in use.
    pub fn config(&self) -> &DirectoryConfig {
        &self.config
    }

    /// Cache key of this directory.
    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    /// The cached entry if it is still fresh at `now`.
    pub fn current(&self, now: DateTime<Utc>) -> Option<DirectoryEntry> {
        self.cache.load(&self.key).filter(|entry| !entry.is_stale(now, self.config.timeout))
    }

    /// Resolve the server list.
    ///
    /// A fresh cached list is returned unless `force` is set. Otherwise
    /// `fetch` is called with the bootstrap server, then with each fallback
    /// server in turn, until one yields a non-empty list. That list is stored
    /// and returned. If none does, the fallback list is returned unstored.
    pub fn get_servers<F>(&self, now: DateTime<Utc>, force: bool, mut fetch: F) -> Resolved
    where
        F: FnMut(&str) -> Result<Vec<String>, TransportError>,
    {
        if !force && let Some(entry) = self.current(now) {
            tracing::debug!(servers = entry.servers.len(), "server list served from cache");
            return Resolved { servers: entry.servers, source: DirectorySource::Cache };
        }

        let _guard = self.refresh_lock.lock().unwrap_or_else(PoisonError::into_inner);

        // Another caller may have refreshed while we waited.
        if !force && let Some(entry) = self.current(now) {
            tracing::debug!("server list refreshed by concurrent caller");
            return Resolved { servers: entry.servers, source: DirectorySource::Cache };
        }

        for bootstrap in self.bootstraps() {
            match fetch(bootstrap) {
                Ok(servers) if !servers.is_empty() => {
                    tracing::debug!(%bootstrap, servers = servers.len(), "server list refreshed");
                    let entry = DirectoryEntry { servers: servers.clone(), cached_at: now };
                    self.cache.store(&self.key, entry);
                    return Resolved { servers, source: DirectorySource::Remote };
                },
                Ok(_) => tracing::warn!(%bootstrap, "bootstrap returned an empty server list"),
                Err(error) => tracing::warn!(%bootstrap, %error, "server list fetch failed"),
            }
        }

        tracing::warn!("no server list available, using built-in servers for this attempt");
        Resolved { servers: self.config.fallback.clone(), source: DirectorySource::Fallback }
    }

    /// Drop the cached list so the next lookup refreshes.
    pub fn invalidate(&self) {
        let _guard = self.refresh_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.cache.evict(&self.key);
    }

    fn bootstraps(&self) -> impl Iterator<Item = &str> {
        let bootstrap = self.config.bootstrap.as_str();
        std::iter::once(bootstrap)
            .chain(self.config.fallback.iter().map(String::as_str).filter(move |s| *s != bootstrap))
    }
}

impl<C> fmt::Debug for ServerDirectory<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerDirectory")
            .field("key", &self.key)
            .field("config", &self.config)
            .finish()
    }
}
