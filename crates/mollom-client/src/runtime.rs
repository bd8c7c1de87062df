//! Wiring shared by the production clients.

use std::sync::Arc;

use mollom_core::{DirectoryCache, MemoryDirectoryCache, ServerDirectory};

use crate::{config::MollomConfig, file_cache::FileDirectoryCache};

/// Directory cache chosen at runtime.
pub type SharedCache = Arc<dyn DirectoryCache>;

/// File cache if `caching.cache_file` is set, memory otherwise.
pub fn shared_cache(config: &MollomConfig) -> SharedCache {
    match &config.caching.cache_file {
        Some(path) => Arc::new(FileDirectoryCache::new(path)),
        None => Arc::new(MemoryDirectoryCache::new()),
    }
}

/// Server directory for a configuration. Clone the `Arc` to share one
/// directory between clients with the same keys.
pub fn shared_directory(config: &MollomConfig) -> Arc<ServerDirectory<SharedCache>> {
    Arc::new(ServerDirectory::new(
        shared_cache(config),
        &config.credentials(),
        config.directory_config(),
    ))
}
