//! Page fetch cache
//!
//! Wraps any `PageFetcher` with a moka async cache keyed by URL. Rendering a
//! page through the scraping API is the slowest and most expensive step of
//! an analysis, so successful fetches are kept for the configured TTL.
//! Failed fetches are never cached.

use async_trait::async_trait;
use cga_core::{CacheConfig, PageFetcher, Result};
use moka::future::Cache;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Cached Fetcher
// ============================================================================

/// Page fetcher that memoizes HTML by URL
pub struct CachedFetcher<F> {
    inner: F,
    cache: Cache<String, String>,
    stats: Arc<CacheStats>,
}

impl<F: PageFetcher> CachedFetcher<F> {
    /// Wrap a fetcher using the given cache settings
    pub fn new(inner: F, config: &CacheConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.max_capacity)
            .time_to_live(Duration::from_secs(config.ttl_secs))
            .build();

        Self {
            inner,
            cache,
            stats: Arc::new(CacheStats::new("page")),
        }
    }

    /// Check if a page is cached
    pub async fn contains(&self, url: &str) -> bool {
        self.cache.contains_key(url)
    }

    /// Drop a cached page
    pub async fn invalidate(&self, url: &str) {
        self.cache.invalidate(url).await;
    }

    /// Clear all cached pages
    pub async fn clear(&self) {
        self.cache.invalidate_all();
        // Wait for all pending invalidations to complete
        self.cache.run_pending_tasks().await;
        self.stats.reset();
    }

    /// Get cache statistics
    pub fn stats(&self) -> Arc<CacheStats> {
        Arc::clone(&self.stats)
    }

    /// Get current cache size
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

#[async_trait]
impl<F: PageFetcher> PageFetcher for CachedFetcher<F> {
    async fn fetch(&self, url: &str) -> Result<String> {
        if let Some(html) = self.cache.get(url).await {
            self.stats.record_hit();
            tracing::debug!("Page cache hit: {}", url);
            return Ok(html);
        }
        self.stats.record_miss();

        let html = self.inner.fetch(url).await?;
        self.cache.insert(url.to_string(), html.clone()).await;
        self.stats.record_write();

        Ok(html)
    }
}

// ============================================================================
// Cache Statistics
// ============================================================================

/// Statistics for cache performance monitoring
#[derive(Debug)]
pub struct CacheStats {
    /// Cache name for identification
    name: String,
    hits: AtomicU64,
    misses: AtomicU64,
    writes: AtomicU64,
}

impl CacheStats {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            writes: AtomicU64::new(0),
        }
    }

    fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::Relaxed);
    }

    fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.writes.store(0, Ordering::Relaxed);
    }

    /// Get cache name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    /// Calculate hit rate (0.0 - 1.0)
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits() + self.misses();
        if total == 0 {
            0.0
        } else {
            self.hits() as f64 / total as f64
        }
    }

    /// Get a summary report
    pub fn report(&self) -> CacheStatsReport {
        CacheStatsReport {
            name: self.name.clone(),
            hits: self.hits(),
            misses: self.misses(),
            writes: self.writes(),
            hit_rate: self.hit_rate(),
        }
    }
}

/// Serializable cache statistics report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStatsReport {
    pub name: String,
    pub hits: u64,
    pub misses: u64,
    pub writes: u64,
    /// Hit rate (0.0 - 1.0)
    pub hit_rate: f64,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use cga_core::CgaError;
    use std::sync::atomic::AtomicUsize;

    struct CountingFetcher {
        calls: AtomicUsize,
    }

    impl CountingFetcher {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl PageFetcher for CountingFetcher {
        async fn fetch(&self, url: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if url.contains("broken") {
                Err(CgaError::upstream("test", "status 500"))
            } else {
                Ok(format!("<p>{url}</p>"))
            }
        }
    }

    #[tokio::test]
    async fn test_cached_fetch_hits() {
        let fetcher = CachedFetcher::new(CountingFetcher::new(), &CacheConfig::default());

        let first = fetcher.fetch("https://example.com/a").await.unwrap();
        let second = fetcher.fetch("https://example.com/a").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(fetcher.inner.calls.load(Ordering::SeqCst), 1);
        assert_eq!(fetcher.stats().hits(), 1);
        assert_eq!(fetcher.stats().misses(), 1);
        assert_eq!(fetcher.stats().writes(), 1);
        assert!(fetcher.contains("https://example.com/a").await);
    }

    #[tokio::test]
    async fn test_failures_not_cached() {
        let fetcher = CachedFetcher::new(CountingFetcher::new(), &CacheConfig::default());

        assert!(fetcher.fetch("https://broken.example").await.is_err());
        assert!(fetcher.fetch("https://broken.example").await.is_err());

        assert_eq!(fetcher.inner.calls.load(Ordering::SeqCst), 2);
        assert_eq!(fetcher.stats().writes(), 0);
        assert!(!fetcher.contains("https://broken.example").await);
    }

    #[tokio::test]
    async fn test_cache_clear() {
        let fetcher = CachedFetcher::new(CountingFetcher::new(), &CacheConfig::default());

        fetcher.fetch("https://example.com/a").await.unwrap();
        fetcher.clear().await;
        fetcher.fetch("https://example.com/a").await.unwrap();

        assert_eq!(fetcher.inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalidate() {
        let fetcher = CachedFetcher::new(CountingFetcher::new(), &CacheConfig::default());

        fetcher.fetch("https://example.com/a").await.unwrap();
        fetcher.invalidate("https://example.com/a").await;
        assert!(!fetcher.contains("https://example.com/a").await);
    }

    #[test]
    fn test_stats_report() {
        let stats = CacheStats::new("page");
        stats.record_miss();
        stats.record_write();
        stats.record_hit();

        let report = stats.report();
        assert_eq!(report.name, "page");
        assert_eq!(report.hits, 1);
        assert!((report.hit_rate - 0.5).abs() < f64::EPSILON);
    }
}
