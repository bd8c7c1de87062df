//! Server list caching under a simulated clock.

use std::{sync::Arc, thread, time::Duration};

use mollom_core::{
    CacheKey, Credentials, DirectoryCache, DirectoryConfig, DirectorySource, Dispatcher,
    MemoryDirectoryCache, ServerDirectory,
};
use mollom_harness::{ScriptedTransport, SimEnv};
use mollom_proto::{Params, RequestEnvelope};

const BOOT: &str = "http://boot";
const HOUR: Duration = Duration::from_secs(3600);

fn directory(
    cache: Arc<MemoryDirectoryCache>,
    timeout: Duration,
) -> Arc<ServerDirectory<Arc<MemoryDirectoryCache>>> {
    let config = DirectoryConfig { bootstrap: BOOT.to_string(), fallback: Vec::new(), timeout };
    Arc::new(ServerDirectory::new(cache, &Credentials::new("pub", "priv"), config))
}

#[test]
fn list_is_refetched_once_stale() {
    let env = SimEnv::with_seed(3);
    let transport = ScriptedTransport::<String>::new();
    transport.server_list(BOOT, &["http://a"]).server_list(BOOT, &["http://b"]);
    let dispatcher = Dispatcher::new(
        env.clone(),
        transport.clone(),
        directory(Arc::new(MemoryDirectoryCache::new()), 24 * HOUR),
        0,
    );

    assert_eq!(dispatcher.servers(false).source, DirectorySource::Remote);

    env.advance(23 * HOUR);
    let cached = dispatcher.servers(false);
    assert_eq!(cached.source, DirectorySource::Cache);
    assert_eq!(cached.servers, vec!["http://a"]);

    env.advance(HOUR);
    let fresh = dispatcher.servers(false);
    assert_eq!(fresh.source, DirectorySource::Remote);
    assert_eq!(fresh.servers, vec!["http://b"]);
    assert_eq!(transport.directory_requests(), 2);
}

#[test]
fn stale_list_is_kept_when_refresh_fails() {
    let env = SimEnv::with_seed(3);
    let transport = ScriptedTransport::<String>::new();
    transport.server_list(BOOT, &["http://a"]);
    let cache = Arc::new(MemoryDirectoryCache::new());
    let directory = directory(Arc::clone(&cache), HOUR);
    let dispatcher = Dispatcher::new(env.clone(), transport, Arc::clone(&directory), 0);

    dispatcher.servers(false);
    env.advance(2 * HOUR);
    let resolved = dispatcher.servers(false);

    // Nothing configured to fall back on, and the stale entry stays put.
    assert_eq!(resolved.source, DirectorySource::Fallback);
    assert!(resolved.servers.is_empty());
    assert_eq!(cache.load(directory.key()).map(|e| e.servers), Some(vec!["http://a".to_string()]));
}

#[test]
fn clients_with_same_keys_share_one_list() {
    let env = SimEnv::with_seed(5);
    let cache = Arc::new(MemoryDirectoryCache::new());
    let transport = ScriptedTransport::<String>::new();
    transport.server_list(BOOT, &["http://a"]);
    transport.reply("http://a", Ok("one".to_string())).reply("http://a", Ok("two".to_string()));

    let first_directory = directory(Arc::clone(&cache), 24 * HOUR);
    let second_directory = directory(Arc::clone(&cache), 24 * HOUR);
    let first = Dispatcher::new(env.clone(), transport.clone(), first_directory, 0);
    let second = Dispatcher::new(env, transport.clone(), second_directory, 0);
    let envelope = RequestEnvelope::rpc("verifyKey", Params::new());

    assert_eq!(first.invoke(&envelope).unwrap().value, "one");
    assert_eq!(second.invoke(&envelope).unwrap().value, "two");
    assert_eq!(transport.directory_requests(), 1);
}

#[test]
fn different_keys_do_not_share() {
    let a = CacheKey::for_credentials(&Credentials::new("pub", "one"));
    let b = CacheKey::for_credentials(&Credentials::new("pub", "two"));

    assert_ne!(a, b);
}

#[test]
fn concurrent_callers_fetch_once() {
    let env = SimEnv::with_seed(9);
    let transport = ScriptedTransport::<String>::new();
    transport.server_list(BOOT, &["http://a"]);
    for _ in 0..8 {
        transport.reply("http://a", Ok("ok".to_string()));
    }
    let directory = directory(Arc::new(MemoryDirectoryCache::new()), 24 * HOUR);
    let dispatcher = Dispatcher::new(env, transport.clone(), directory, 0);
    let envelope = RequestEnvelope::rpc("verifyKey", Params::new());

    thread::scope(|s| {
        for _ in 0..8 {
            s.spawn(|| dispatcher.invoke(&envelope).unwrap());
        }
    });

    assert_eq!(transport.directory_requests(), 1);
    assert_eq!(transport.call_servers().len(), 8);
}
