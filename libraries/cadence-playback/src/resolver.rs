//! Media source resolution with a per-session URL cache
//!
//! Resolved URLs are assumed valid for the session and are never invalidated
//! proactively. The cache is an LRU bounded by `PlaybackConfig::source_cache_capacity`,
//! so any queue shorter than the capacity resolves each track at most once.

use crate::error::Result;
use cadence_core::{MediaSourceApi, Quality};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

/// Resolves track identifiers to playable URLs, caching successes
pub struct MediaSourceResolver {
    api: Arc<dyn MediaSourceApi>,
    quality: Quality,
    cache: Mutex<LruCache<String, String>>,
}

impl MediaSourceResolver {
    /// Create a resolver backed by `api`
    ///
    /// A capacity of 0 is treated as 1.
    pub fn new(api: Arc<dyn MediaSourceApi>, quality: Quality, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);

        Self {
            api,
            quality,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Cached URL for `track_id`, without touching the network
    pub fn cached(&self, track_id: &str) -> Option<String> {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(track_id)
            .cloned()
    }

    /// Resolve `track_id`, hitting the backend only on a cache miss
    ///
    /// Failures are not cached and not retried here.
    pub async fn resolve(&self, track_id: &str) -> Result<String> {
        if let Some(url) = self.cached(track_id) {
            debug!(track_id, "Media source cache hit");
            return Ok(url);
        }

        debug!(track_id, quality = %self.quality, "Resolving media source");
        let url = self
            .api
            .resolve_media_source(track_id, self.quality)
            .await?;

        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .put(track_id.to_string(), url.clone());

        Ok(url)
    }

    /// Number of cached entries
    pub fn cached_len(&self) -> usize {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn quality(&self) -> Quality {
        self.quality
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlaybackError;
    use async_trait::async_trait;
    use cadence_core::CoreError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingApi {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl MediaSourceApi for CountingApi {
        async fn resolve_media_source(
            &self,
            track_id: &str,
            quality: Quality,
        ) -> cadence_core::Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match track_id {
                "missing" => Err(CoreError::source_unavailable(track_id)),
                "offline" => Err(CoreError::network("connection refused")),
                _ => Ok(format!("https://cdn.test/{track_id}.{quality}.m4a")),
            }
        }
    }

    fn resolver(capacity: usize) -> (Arc<CountingApi>, MediaSourceResolver) {
        let api = Arc::new(CountingApi::default());
        let resolver = MediaSourceResolver::new(api.clone(), Quality::High, capacity);
        (api, resolver)
    }

    #[tokio::test]
    async fn second_resolve_uses_cache() {
        let (api, resolver) = resolver(8);

        let first = resolver.resolve("t1").await.unwrap();
        assert_eq!(resolver.cached("t1"), Some(first.clone()));
        let second = resolver.resolve("t1").await.unwrap();

        assert_eq!(first, "https://cdn.test/t1.high.m4a");
        assert_eq!(first, second);
        assert_eq!(api.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let (api, resolver) = resolver(8);

        let err = resolver.resolve("missing").await.unwrap_err();
        assert!(matches!(err, PlaybackError::SourceUnavailable(id) if id == "missing"));

        let err = resolver.resolve("offline").await.unwrap_err();
        assert!(matches!(err, PlaybackError::Network(_)));

        assert!(resolver.resolve("missing").await.is_err());
        assert_eq!(api.calls.load(Ordering::SeqCst), 3);
        assert_eq!(resolver.cached_len(), 0);
    }

    #[tokio::test]
    async fn capacity_bounds_cache() {
        let (api, resolver) = resolver(2);

        resolver.resolve("a").await.unwrap();
        resolver.resolve("b").await.unwrap();
        resolver.resolve("c").await.unwrap();

        assert_eq!(resolver.cached_len(), 2);
        assert!(resolver.cached("a").is_none());
        assert!(resolver.cached("c").is_some());
        assert_eq!(api.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn zero_capacity_still_caches_one() {
        let (_api, resolver) = resolver(0);
        resolver.resolve("a").await.unwrap();
        assert_eq!(resolver.cached_len(), 1);
    }
}
