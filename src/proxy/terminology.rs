use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::error::{AppError, AppResult};
use crate::proxy::cache::ResponseCache;
use crate::proxy::upstream::UpstreamClient;
use crate::proxy::TokenManager;

/// Proxy service statistics
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ProxyStats {
    pub total_requests: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub upstream_errors: u64,
    pub timeouts: u64,
    pub auth_errors: u64,
}

#[derive(Default)]
struct StatsCounters {
    total_requests: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    upstream_errors: AtomicU64,
    timeouts: AtomicU64,
    auth_errors: AtomicU64,
}

/// Resolves terminology lookups through the cache, fetching on a miss
pub struct TerminologyProxy {
    cache: Arc<ResponseCache>,
    token_manager: Arc<TokenManager>,
    upstream: UpstreamClient,
    request_timeout: Duration,
    cache_ttl: Duration,
    stats: StatsCounters,
}

impl TerminologyProxy {
    pub fn new(
        cache: Arc<ResponseCache>,
        token_manager: Arc<TokenManager>,
        upstream: UpstreamClient,
        request_timeout: Duration,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            cache,
            token_manager,
            upstream,
            request_timeout,
            cache_ttl,
            stats: StatsCounters::default(),
        }
    }

    /// Look up `path` with the verbatim `query` string
    pub async fn handle(&self, path: &str, query: Option<&str>) -> AppResult<Value> {
        self.stats.total_requests.fetch_add(1, Ordering::Relaxed);

        let url = self.upstream.build_url(path, query);
        if let Err(e) = self.upstream.ensure_within_fhir(&url) {
            self.record_failure(&e);
            return Err(e);
        }

        if let Some(body) = self.cache.get(&url) {
            self.stats.cache_hits.fetch_add(1, Ordering::Relaxed);
            tracing::debug!("Cache hit: {}", url);
            return Ok(body);
        }
        self.stats.cache_misses.fetch_add(1, Ordering::Relaxed);

        let result = self.fetch_and_store(&url).await;
        if let Err(e) = &result {
            self.record_failure(e);
        }
        result
    }

    async fn fetch_and_store(&self, url: &str) -> AppResult<Value> {
        let access_token = self.token_manager.get_valid_token().await?;

        tracing::info!("Cache miss, fetching {}", url);
        let body = self
            .upstream
            .fetch_json(url, &access_token, self.request_timeout)
            .await?;

        self.cache.set(url, body.clone(), self.cache_ttl);
        Ok(body)
    }

    fn record_failure(&self, err: &AppError) {
        let counter = match err {
            AppError::Timeout(_) => &self.stats.timeouts,
            e if e.is_auth() => &self.stats.auth_errors,
            _ => &self.stats.upstream_errors,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        tracing::warn!("Terminology lookup failed: {}", err);
    }

    pub fn stats(&self) -> ProxyStats {
        ProxyStats {
            total_requests: self.stats.total_requests.load(Ordering::Relaxed),
            cache_hits: self.stats.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.stats.cache_misses.load(Ordering::Relaxed),
            upstream_errors: self.stats.upstream_errors.load(Ordering::Relaxed),
            timeouts: self.stats.timeouts.load(Ordering::Relaxed),
            auth_errors: self.stats.auth_errors.load(Ordering::Relaxed),
        }
    }

    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    pub fn token_manager(&self) -> &Arc<TokenManager> {
        &self.token_manager
    }

    pub fn base_url(&self) -> &str {
        self.upstream.base_url()
    }
}
