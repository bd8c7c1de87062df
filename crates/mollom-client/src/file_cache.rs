//! File-backed server list cache.
//!
//! Lets short-lived processes (the CLI, cron jobs) share one server list
//! instead of fetching a new one on every start. The file is a JSON object
//! keyed by [`CacheKey`]; writes go through a uniquely named temporary file
//! and a rename so readers never see half a document.
//!
//! Every instance opened on the same path in one process shares a lock, so
//! read-modify-write cycles from different clients never drop each other's
//! keys.

use std::{
    collections::{BTreeMap, HashMap},
    fs,
    io::{self, Write as _},
    path::{self, Path, PathBuf},
    sync::{Arc, Mutex, OnceLock, PoisonError},
};

use chrono::{DateTime, Utc};
use mollom_core::{CacheKey, DirectoryCache, DirectoryEntry};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
struct StoredEntry {
    servers: Vec<String>,
    cached_at: DateTime<Utc>,
}

type Document = BTreeMap<String, StoredEntry>;

/// Lock shared by every cache opened on `path`.
fn path_lock(path: &Path) -> Arc<Mutex<()>> {
    static LOCKS: OnceLock<Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>> = OnceLock::new();

    let key = path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut locks =
        LOCKS.get_or_init(Mutex::default).lock().unwrap_or_else(PoisonError::into_inner);
    Arc::clone(locks.entry(key).or_default())
}

/// Server lists persisted to a JSON file.
#[derive(Debug)]
pub struct FileDirectoryCache {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl FileDirectoryCache {
    /// Cache stored at `path`. The file is created on first store.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let lock = path_lock(&path);
        Self { path, lock }
    }

    /// Location of the cache file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Document {
        match fs::read_to_string(&self.path) {
            Ok(text) => serde_json::from_str(&text).unwrap_or_else(|e| {
                tracing::warn!(path = %self.path.display(), "ignoring corrupt cache: {}", e);
                Document::new()
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Document::new(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "cannot read cache: {}", e);
                Document::new()
            },
        }
    }

    fn write(&self, doc: &Document) -> io::Result<()> {
        let parent =
            self.path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
        fs::create_dir_all(parent)?;
        let json = serde_json::to_vec_pretty(doc).map_err(io::Error::other)?;
        let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
        tmp.write_all(&json)?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }

    fn update(&self, change: impl FnOnce(&mut Document)) {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut doc = self.read();
        change(&mut doc);
        if let Err(e) = self.write(&doc) {
            tracing::warn!(path = %self.path.display(), "cannot write cache: {}", e);
        }
    }
}

impl DirectoryCache for FileDirectoryCache {
    fn load(&self, key: &CacheKey) -> Option<DirectoryEntry> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.read()
            .remove(key.as_str())
            .map(|stored| DirectoryEntry { servers: stored.servers, cached_at: stored.cached_at })
    }

    fn store(&self, key: &CacheKey, entry: DirectoryEntry) {
        self.update(|doc| {
            doc.insert(
                key.as_str().to_string(),
                StoredEntry { servers: entry.servers, cached_at: entry.cached_at },
            );
        });
    }

    fn evict(&self, key: &CacheKey) {
        self.update(|doc| {
            doc.remove(key.as_str());
        });
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Barrier, thread};

    use chrono::TimeZone;
    use mollom_core::Credentials;

    use super::*;

    fn entry(servers: &[&str]) -> DirectoryEntry {
        DirectoryEntry {
            servers: servers.iter().map(ToString::to_string).collect(),
            cached_at: Utc.with_ymd_and_hms(2012, 2, 8, 10, 0, 0).unwrap(),
        }
    }

    #[test]
    fn entries_survive_a_new_instance() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache/servers.json");
        let key = CacheKey::for_credentials(&Credentials::new("pub", "priv"));

        FileDirectoryCache::new(&path).store(&key, entry(&["http://a", "http://b"]));
        let loaded = FileDirectoryCache::new(&path).load(&key);

        assert_eq!(loaded, Some(entry(&["http://a", "http://b"])));
    }

    #[test]
    fn keys_are_independent() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileDirectoryCache::new(dir.path().join("servers.json"));
        let a = CacheKey::for_credentials(&Credentials::new("a", "1"));
        let b = CacheKey::for_credentials(&Credentials::new("b", "2"));

        cache.store(&a, entry(&["http://a"]));
        cache.store(&b, entry(&["http://b"]));
        cache.evict(&a);

        assert_eq!(cache.load(&a), None);
        assert_eq!(cache.load(&b), Some(entry(&["http://b"])));
    }

    #[test]
    fn corrupt_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("servers.json");
        fs::write(&path, "not json").unwrap();
        let key = CacheKey::for_credentials(&Credentials::new("pub", "priv"));

        let cache = FileDirectoryCache::new(&path);
        assert_eq!(cache.load(&key), None);

        cache.store(&key, entry(&["http://a"]));
        assert_eq!(cache.load(&key), Some(entry(&["http://a"])));
    }

    #[test]
    fn private_key_not_written_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("servers.json");
        let key = CacheKey::for_credentials(&Credentials::new("pub", "secret-value"));

        FileDirectoryCache::new(&path).store(&key, entry(&["http://a"]));

        assert!(!fs::read_to_string(&path).unwrap().contains("secret-value"));
    }

    #[test]
    fn instances_on_one_path_do_not_drop_each_others_keys() {
        let dir = tempfile::tempdir().unwrap();
        let a = CacheKey::for_credentials(&Credentials::new("a", "1"));
        let b = CacheKey::for_credentials(&Credentials::new("b", "2"));

        for round in 0..200 {
            let path = dir.path().join(format!("servers-{round}.json"));
            let barrier = Barrier::new(2);
            thread::scope(|s| {
                for key in [&a, &b] {
                    let cache = FileDirectoryCache::new(&path);
                    let barrier = &barrier;
                    s.spawn(move || {
                        barrier.wait();
                        cache.store(key, entry(&["http://a"]));
                    });
                }
            });

            let cache = FileDirectoryCache::new(&path);
            assert!(cache.load(&a).is_some(), "round {round} lost key a");
            assert!(cache.load(&b).is_some(), "round {round} lost key b");
        }
        let leftovers = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 200);
    }
}
