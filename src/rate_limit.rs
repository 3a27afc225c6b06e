//! Fixed-window request counting per client.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};

pub const DEFAULT_MAX_REQUESTS: u32 = 60;
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);
pub const UNKNOWN_CLIENT: &str = "unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateWindowEntry {
    pub count: u32,
    pub reset_at: Instant,
}

/// Counter storage. `increment` is a single read-modify-write on one key:
/// it starts a fresh window when none exists or the old one has elapsed,
/// and otherwise bumps the count.
#[async_trait]
pub trait CounterStore: Send + Sync {
    async fn increment(&self, key: &str, window: Duration) -> RateWindowEntry;
    /// Remove entries whose window has elapsed; returns how many.
    async fn sweep(&self) -> usize;
}

#[derive(Debug, Default)]
pub struct MemoryCounterStore {
    entries: DashMap<String, RateWindowEntry>,
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn increment(&self, key: &str, window: Duration) -> RateWindowEntry {
        let now = Instant::now();
        // the shard stays locked until `entry` is dropped
        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert(RateWindowEntry {
                count: 0,
                reset_at: now + window,
            });
        if now > entry.reset_at {
            *entry = RateWindowEntry {
                count: 0,
                reset_at: now + window,
            };
        }
        entry.count = entry.count.saturating_add(1);
        *entry
    }

    async fn sweep(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, e| now <= e.reset_at);
        before.saturating_sub(self.entries.len())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    /// Time until the current window closes.
    pub reset_in: Duration,
}

#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn CounterStore>,
    max: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn CounterStore>, max: u32, window: Duration) -> Self {
        Self { store, max, window }
    }

    pub fn in_memory(max: u32, window: Duration) -> Self {
        Self::new(Arc::new(MemoryCounterStore::new()), max, window)
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    pub async fn check(&self, identifier: &str) -> RateDecision {
        let entry = self.store.increment(identifier, self.window).await;
        let reset_in = entry.reset_at.saturating_duration_since(Instant::now());
        let allowed = entry.count <= self.max;
        if !allowed {
            debug!(identifier, count = entry.count, "rate limit exceeded");
        }
        RateDecision {
            allowed,
            limit: self.max,
            remaining: self.max.saturating_sub(entry.count),
            reset_in,
        }
    }

    pub async fn sweep(&self) -> usize {
        self.store.sweep().await
    }

    /// Sweep elapsed windows every `every` until the task is aborted.
    pub fn spawn_sweeper(&self, every: Duration) -> JoinHandle<()> {
        let limiter = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let removed = limiter.sweep().await;
                if removed > 0 {
                    info!(removed, "swept rate-limit windows");
                }
            }
        })
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::in_memory(DEFAULT_MAX_REQUESTS, DEFAULT_WINDOW)
    }
}

/// Best-effort client key: first `X-Forwarded-For` hop, then `X-Real-IP`,
/// then a shared bucket.
pub fn client_identifier<'a>(forwarded_for: Option<&'a str>, real_ip: Option<&'a str>) -> &'a str {
    forwarded_for
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .or_else(|| real_ip.map(str::trim).filter(|v| !v.is_empty()))
        .unwrap_or(UNKNOWN_CLIENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn denies_after_max_then_resets() {
        let limiter = RateLimiter::in_memory(2, Duration::from_secs(60));

        let first = limiter.check("1.2.3.4").await;
        assert!(first.allowed);
        assert_eq!(first.remaining, 1);
        assert!(limiter.check("1.2.3.4").await.allowed);

        let third = limiter.check("1.2.3.4").await;
        assert!(!third.allowed);
        assert_eq!(third.remaining, 0);
        assert_eq!(third.reset_in, Duration::from_secs(60));

        tokio::time::advance(Duration::from_secs(61)).await;
        let fresh = limiter.check("1.2.3.4").await;
        assert!(fresh.allowed);
        assert_eq!(fresh.remaining, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn clients_are_counted_separately() {
        let limiter = RateLimiter::in_memory(1, Duration::from_secs(60));
        assert!(limiter.check("a").await.allowed);
        assert!(!limiter.check("a").await.allowed);
        assert!(limiter.check("b").await.allowed);
    }

    #[tokio::test(start_paused = true)]
    async fn reports_time_left_in_window() {
        let limiter = RateLimiter::in_memory(1, Duration::from_secs(60));
        limiter.check("a").await;
        tokio::time::advance(Duration::from_secs(45)).await;
        let denied = limiter.check("a").await;
        assert!(!denied.allowed);
        assert_eq!(denied.reset_in, Duration::from_secs(15));
    }

    #[tokio::test(start_paused = true)]
    async fn sweep_removes_elapsed_windows() {
        let store = Arc::new(MemoryCounterStore::new());
        let limiter = RateLimiter::new(store.clone(), 5, Duration::from_secs(10));
        limiter.check("old").await;
        tokio::time::advance(Duration::from_secs(8)).await;
        limiter.check("new").await;
        tokio::time::advance(Duration::from_secs(5)).await;

        assert_eq!(limiter.sweep().await, 1);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_checks_count_every_request() {
        let limiter = RateLimiter::in_memory(50, Duration::from_secs(60));
        let handles: Vec<_> = (0..40)
            .map(|_| {
                let limiter = limiter.clone();
                tokio::spawn(async move { limiter.check("shared").await })
            })
            .collect();
        for handle in handles {
            assert!(handle.await.unwrap().allowed);
        }
        assert_eq!(limiter.check("shared").await.remaining, 50 - 41);
    }

    #[test]
    fn identifier_extraction() {
        assert_eq!(
            client_identifier(Some("203.0.113.9, 10.0.0.1"), Some("10.0.0.2")),
            "203.0.113.9"
        );
        assert_eq!(client_identifier(None, Some(" 10.0.0.2 ")), "10.0.0.2");
        assert_eq!(client_identifier(Some(""), None), UNKNOWN_CLIENT);
        assert_eq!(client_identifier(None, None), UNKNOWN_CLIENT);
    }
}
