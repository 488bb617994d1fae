//! Development cache for fetched content
//!
//! Fetched pages and likes lists are stored as JSON blobs so repeated
//! renders during development skip the content source. Storage is a
//! [`CacheStore`] backend; [`DevCache`] sanitizes keys and wraps every
//! entry in a `{cachedAt, data}` envelope.
//!
//! Nothing here is fatal: I/O failures and corrupted entries are logged and
//! treated as misses. Async callers use [`DevCache::load`] and
//! [`DevCache::save`], which run the store on tokio's blocking pool.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Characters that are not allowed in file names on common filesystems
const FORBIDDEN_KEY_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Raw key/value storage, namespaced
pub trait CacheStore: Send + Sync {
    /// Read an entry, `Ok(None)` when absent
    fn read(&self, namespace: &str, key: &str) -> io::Result<Option<String>>;

    /// Write an entry, replacing any previous value
    fn write(&self, namespace: &str, key: &str, value: &str) -> io::Result<()>;

    /// Remove every entry
    fn clear(&self) -> io::Result<()>;
}

/// Stores entries as `<root>/<namespace>/<key>.json`
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    /// Create a store rooted at a directory (created lazily)
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn entry_path(&self, namespace: &str, key: &str) -> PathBuf {
        self.root.join(namespace).join(format!("{}.json", key))
    }
}

impl CacheStore for FsStore {
    fn read(&self, namespace: &str, key: &str) -> io::Result<Option<String>> {
        match fs::read_to_string(self.entry_path(namespace, key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn write(&self, namespace: &str, key: &str, value: &str) -> io::Result<()> {
        fs::create_dir_all(self.root.join(namespace))?;
        fs::write(self.entry_path(namespace, key), value)
    }

    fn clear(&self) -> io::Result<()> {
        if self.root.exists() {
            fs::remove_dir_all(&self.root)?;
        }
        Ok(())
    }
}

/// In-process store, mostly for tests and one-shot renders
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<(String, String), String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> io::Result<std::sync::MutexGuard<'_, HashMap<(String, String), String>>> {
        self.entries
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "memory cache lock poisoned"))
    }
}

impl CacheStore for MemoryStore {
    fn read(&self, namespace: &str, key: &str) -> io::Result<Option<String>> {
        Ok(self
            .lock()?
            .get(&(namespace.to_string(), key.to_string()))
            .cloned())
    }

    fn write(&self, namespace: &str, key: &str, value: &str) -> io::Result<()> {
        self.lock()?
            .insert((namespace.to_string(), key.to_string()), value.to_string());
        Ok(())
    }

    fn clear(&self) -> io::Result<()> {
        self.lock()?.clear();
        Ok(())
    }
}

/// Envelope written around every cached value
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEnvelope<T> {
    pub cached_at: DateTime<Utc>,
    pub data: T,
}

/// Typed cache over a [`CacheStore`]
#[derive(Clone)]
pub struct DevCache {
    store: Arc<dyn CacheStore>,
    max_age: Option<Duration>,
}

impl DevCache {
    /// Wrap a store
    pub fn new(store: impl CacheStore + 'static) -> Self {
        Self {
            store: Arc::new(store),
            max_age: None,
        }
    }

    /// Filesystem-backed cache
    pub fn on_disk<P: AsRef<Path>>(dir: P) -> Self {
        Self::new(FsStore::new(dir))
    }

    /// Treat entries older than `max_age` as misses
    pub fn with_max_age(mut self, max_age: Option<Duration>) -> Self {
        self.max_age = max_age;
        self
    }

    /// Look up an entry. Absent, stale, unreadable or corrupted entries are misses.
    pub fn get<T: DeserializeOwned>(&self, namespace: &str, key: &str) -> Option<T> {
        let key = sanitize_key(key);

        let raw = match self.store.read(namespace, &key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!("Cache read failed for {}/{}: {}", namespace, key, e);
                return None;
            }
        };

        let envelope: CacheEnvelope<T> = match serde_json::from_str(&raw) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::warn!("Corrupted cache entry {}/{}, refetching: {}", namespace, key, e);
                return None;
            }
        };

        if let Some(max_age) = self.max_age {
            let age = Utc::now().signed_duration_since(envelope.cached_at);
            if age.to_std().map_or(false, |age| age > max_age) {
                tracing::debug!("Cache entry {}/{} expired", namespace, key);
                return None;
            }
        }

        tracing::debug!("Cache hit: {}/{}", namespace, key);
        Some(envelope.data)
    }

    /// Store an entry; last write wins
    pub fn put<T: Serialize>(&self, namespace: &str, key: &str, data: &T) {
        self.write_entry(namespace, key, encode_entry(data));
    }

    /// [`DevCache::get`] off the async runtime
    pub async fn load<T>(&self, namespace: &str, key: &str) -> Option<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let cache = self.clone();
        let (namespace, key) = (namespace.to_string(), key.to_string());
        match tokio::task::spawn_blocking(move || cache.get(&namespace, &key)).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!("Cache read task failed: {}", e);
                None
            }
        }
    }

    /// [`DevCache::put`] off the async runtime
    pub async fn save<T: Serialize>(&self, namespace: &str, key: &str, data: &T) {
        let json = encode_entry(data);
        let cache = self.clone();
        let (namespace, key) = (namespace.to_string(), key.to_string());
        let task = tokio::task::spawn_blocking(move || cache.write_entry(&namespace, &key, json));
        if let Err(e) = task.await {
            tracing::warn!("Cache write task failed: {}", e);
        }
    }

    fn write_entry(&self, namespace: &str, key: &str, json: serde_json::Result<String>) {
        let key = sanitize_key(key);
        let result = json
            .map_err(io::Error::from)
            .and_then(|json| self.store.write(namespace, &key, &json));

        if let Err(e) = result {
            tracing::warn!("Cache write failed for {}/{}: {}", namespace, key, e);
        }
    }

    /// Drop every entry
    pub fn clear(&self) -> io::Result<()> {
        self.store.clear()
    }
}

fn encode_entry<T: Serialize>(data: &T) -> serde_json::Result<String> {
    serde_json::to_string(&CacheEnvelope {
        cached_at: Utc::now(),
        data,
    })
}

/// Make a key safe to use as a file name
pub fn sanitize_key(key: &str) -> String {
    let sanitized: String = key
        .chars()
        .map(|c| {
            if FORBIDDEN_KEY_CHARS.contains(&c) || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect();

    if sanitized.is_empty() {
        "_".to_string()
    } else {
        sanitized
    }
}
