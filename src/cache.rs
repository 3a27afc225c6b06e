//! Response caching.
//!
//! Two tiers share one [`CacheStore`]:
//! - raw data: aggregated statistics per `(handle, languages?)`, reused by
//!   every visual variant, with a fixed TTL
//! - full response: the rendered SVG per normalized request, with the TTL the
//!   caller asked for
//!
//! Backend failures never fail a request; they are logged and treated as a
//! miss.

use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::error::CacheError;
use crate::params::CardRequest;
use crate::stats::AggregatedStats;

pub const DEFAULT_DATA_TTL: Duration = Duration::from_secs(1800);

/// Key-value store with per-entry expiry. Writes always overwrite and reset
/// the TTL; reads never extend it.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;
    async fn delete(&self, key: &str) -> Result<(), CacheError>;
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    expires_at: Instant,
}

/// Outcome of a [`MemoryStore::lookup`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Hit(String),
    Miss,
    /// The entry existed but had expired; it has been removed.
    Expired,
}

/// In-process store. Expired entries are dropped lazily on lookup, and
/// [`MemoryStore::sweep`] can bound memory in between.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, CacheEntry>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, key: &str) -> Lookup {
        let now = Instant::now();
        if let Some(entry) = self.entries.get(key) {
            if now <= entry.expires_at {
                return Lookup::Hit(entry.value.clone());
            }
        } else {
            return Lookup::Miss;
        }

        // re-check under the shard lock: a concurrent set may have refreshed it
        match self.entries.remove_if(key, |_, e| now > e.expires_at) {
            Some(_) => Lookup::Expired,
            None => match self.entries.get(key) {
                Some(entry) => Lookup::Hit(entry.value.clone()),
                None => Lookup::Miss,
            },
        }
    }

    /// Drop every expired entry; returns how many were removed.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, e| now <= e.expires_at);
        before.saturating_sub(self.entries.len())
    }

    /// Sweep every `every` until the task is aborted.
    pub fn spawn_sweeper(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let removed = store.sweep();
                if removed > 0 {
                    info!(removed, "swept expired cache entries");
                }
            }
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(match self.lookup(key) {
            Lookup::Hit(value) => {
                debug!(key, "cache hit");
                Some(value)
            }
            Lookup::Miss => {
                debug!(key, "cache miss");
                None
            }
            Lookup::Expired => {
                debug!(key, "cache entry expired");
                None
            }
        })
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        let entry = CacheEntry {
            value,
            expires_at: Instant::now() + ttl,
        };
        self.entries.insert(key.to_string(), entry);
        debug!(key, ttl_secs = ttl.as_secs(), "cache saved");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Key derivation and the two cache tiers on top of a store.
#[derive(Clone)]
pub struct CachePolicy {
    store: Arc<dyn CacheStore>,
    data_ttl: Duration,
}

impl CachePolicy {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self {
            store,
            data_ttl: DEFAULT_DATA_TTL,
        }
    }

    pub fn with_data_ttl(mut self, ttl: Duration) -> Self {
        self.data_ttl = ttl;
        self
    }

    pub fn data_ttl(&self) -> Duration {
        self.data_ttl
    }

    /// Raw-data tier key. Handles are case-insensitive upstream.
    pub fn data_key(handle: &str, include_languages: bool) -> String {
        format!("card-data:{}:{include_languages}", handle.to_ascii_lowercase())
    }

    /// Full-response tier key: the handle plus every visual option, in a
    /// fixed order.
    pub fn response_key(request: &CardRequest) -> String {
        let c = &request.config;
        let stats: Vec<&str> = c.stats.iter().map(|k| k.param()).collect();
        let color = |o: &Option<String>| o.clone().unwrap_or_default();

        let mut key = format!("card:{}", request.handle.to_ascii_lowercase());
        let _ = write!(
            key,
            "|theme={}|bg={}|text={}|title={}|icon={}|radius={}|hide_border={}\
             |hide_username={}|layout={}|stats={}|langs={}|langs_count={}|ttl={}",
            c.theme,
            color(&c.colors.bg),
            color(&c.colors.text),
            color(&c.colors.title),
            color(&c.colors.icon),
            c.border_radius,
            c.hide_border,
            c.hide_username,
            c.layout.param(),
            stats.join(","),
            c.show_languages,
            c.langs_count,
            c.cache_ttl.as_secs(),
        );
        key
    }

    /// Read through the store; backend errors become a miss.
    pub async fn get(&self, key: &str) -> Option<String> {
        match self.store.get(key).await {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "cache read failed, treating as miss");
                None
            }
        }
    }

    pub async fn put(&self, key: &str, value: String, ttl: Duration) {
        if let Err(e) = self.store.set(key, value, ttl).await {
            warn!(key, error = %e, "cache write failed");
        }
    }

    pub async fn cached_stats(
        &self,
        handle: &str,
        include_languages: bool,
    ) -> Option<AggregatedStats> {
        let key = Self::data_key(handle, include_languages);
        let json = self.get(&key).await?;
        match serde_json::from_str(&json) {
            Ok(stats) => Some(stats),
            Err(e) => {
                warn!(key, error = %e, "discarding unreadable cached stats");
                if let Err(e) = self.store.delete(&key).await {
                    warn!(key, error = %e, "cache delete failed");
                }
                None
            }
        }
    }

    pub async fn store_stats(&self, handle: &str, include_languages: bool, stats: &AggregatedStats) {
        let key = Self::data_key(handle, include_languages);
        match serde_json::to_string(stats) {
            Ok(json) => self.put(&key, json, self.data_ttl).await,
            Err(e) => warn!(key, error = %e, "could not serialize stats for cache"),
        }
    }

    pub async fn cached_response(&self, request: &CardRequest) -> Option<String> {
        self.get(&Self::response_key(request)).await
    }

    pub async fn store_response(&self, request: &CardRequest, svg: String) {
        let ttl = request.config.cache_ttl;
        if ttl.is_zero() {
            return;
        }
        self.put(&Self::response_key(request), svg, ttl).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::CardParams;

    #[tokio::test(start_paused = true)]
    async fn entry_expires_after_ttl() {
        let store = MemoryStore::new();
        store
            .set("k", "v".to_string(), Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(store.lookup("k"), Lookup::Expired);
        assert!(store.is_empty());
        assert_eq!(store.lookup("k"), Lookup::Miss);
    }

    #[tokio::test(start_paused = true)]
    async fn write_overwrites_and_resets_ttl() {
        let store = MemoryStore::new();
        store.set("k", "a".into(), Duration::from_secs(10)).await.unwrap();
        tokio::time::advance(Duration::from_secs(8)).await;
        store.set("k", "b".into(), Duration::from_secs(10)).await.unwrap();
        tokio::time::advance(Duration::from_secs(8)).await;
        assert_eq!(store.lookup("k"), Lookup::Hit("b".into()));
    }

    #[tokio::test(start_paused = true)]
    async fn reads_do_not_extend_ttl() {
        let store = MemoryStore::new();
        store.set("k", "a".into(), Duration::from_secs(5)).await.unwrap();
        tokio::time::advance(Duration::from_secs(4)).await;
        assert!(matches!(store.lookup("k"), Lookup::Hit(_)));
        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(store.lookup("k"), Lookup::Expired);
    }

    #[tokio::test(start_paused = true)]
    async fn sweep_drops_only_expired() {
        let store = MemoryStore::new();
        store.set("short", "1".into(), Duration::from_secs(1)).await.unwrap();
        store.set("long", "2".into(), Duration::from_secs(60)).await.unwrap();
        tokio::time::advance(Duration::from_secs(5)).await;
        assert_eq!(store.sweep(), 1);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn background_sweeper_bounds_memory() {
        let store = Arc::new(MemoryStore::new());
        store.set("short", "1".into(), Duration::from_secs(1)).await.unwrap();
        store.set("long", "2".into(), Duration::from_secs(600)).await.unwrap();
        let sweeper = store.spawn_sweeper(Duration::from_secs(60));

        tokio::time::sleep(Duration::from_secs(61)).await;
        assert_eq!(store.len(), 1);
        assert_eq!(store.lookup("long"), Lookup::Hit("2".into()));
        sweeper.abort();
    }

    #[test]
    fn keys_are_normalized_and_distinguish_options() {
        assert_eq!(
            CachePolicy::data_key("OctoCat", true),
            CachePolicy::data_key("octocat", true)
        );
        assert_ne!(
            CachePolicy::data_key("octocat", true),
            CachePolicy::data_key("octocat", false)
        );

        let a = CardParams::for_user("octocat").validate().unwrap();
        let mut params = CardParams::for_user("octocat");
        params.theme = Some("nord".into());
        let b = params.validate().unwrap();
        assert_eq!(CachePolicy::response_key(&a), CachePolicy::response_key(&a.clone()));
        assert_ne!(CachePolicy::response_key(&a), CachePolicy::response_key(&b));
    }

    struct DownStore;

    #[async_trait]
    impl CacheStore for DownStore {
        async fn get(&self, _: &str) -> Result<Option<String>, CacheError> {
            Err(CacheError::Unavailable("connection refused".into()))
        }
        async fn set(&self, _: &str, _: String, _: Duration) -> Result<(), CacheError> {
            Err(CacheError::Unavailable("connection refused".into()))
        }
        async fn delete(&self, _: &str) -> Result<(), CacheError> {
            Err(CacheError::Unavailable("connection refused".into()))
        }
    }

    #[tokio::test]
    async fn unavailable_backend_degrades_to_miss() {
        let policy = CachePolicy::new(Arc::new(DownStore));
        policy.put("k", "v".into(), Duration::from_secs(5)).await;
        assert_eq!(policy.get("k").await, None);
        assert_eq!(policy.cached_stats("octocat", true).await, None);
    }

    #[tokio::test]
    async fn corrupt_stats_are_discarded() {
        let store = Arc::new(MemoryStore::new());
        let key = CachePolicy::data_key("octocat", true);
        store.set(&key, "{not json".into(), Duration::from_secs(60)).await.unwrap();
        let policy = CachePolicy::new(store.clone());
        assert_eq!(policy.cached_stats("octocat", true).await, None);
        assert!(store.is_empty());
    }
}
