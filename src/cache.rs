//! In-process output cache for anonymous `GET` responses, grouped by tag.
//!
//! Writes call [`CacheInvalidator::invalidate`] with their resource tag after
//! committing and before responding, so the next read misses.

use std::{collections::HashMap, sync::Arc, time::Duration};

use axum::{
    body::{Body, Bytes},
    extract::{Request, State},
    http::{HeaderMap, Method, StatusCode, header::AUTHORIZATION},
    middleware::Next,
    response::{IntoResponse, Response},
};
use moka::future::Cache;
use parking_lot::RwLock;
use tracing::{debug, warn};

pub const GENRES_TAG: &str = "genres";
pub const MOVIES_TAG: &str = "movies";

const MAX_CACHED_BODY: usize = 4 * 1024 * 1024;
const MAX_ENTRIES_PER_TAG: u64 = 1_000;

pub trait CacheInvalidator {
    fn invalidate(&self, tag: &str);
}

#[derive(Clone, Debug)]
pub struct CachedResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl IntoResponse for CachedResponse {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

struct Bucket {
    /// Bumped on every invalidation; a fill that started under an older
    /// generation is dropped.
    generation: u64,
    entries: Cache<String, CachedResponse>,
}

#[derive(Clone)]
pub struct OutputCache {
    buckets: Arc<RwLock<HashMap<String, Bucket>>>,
    ttl: Duration,
}

impl OutputCache {
    pub fn new(ttl: Duration) -> Self {
        Self { buckets: Arc::default(), ttl }
    }

    fn empty(&self) -> Cache<String, CachedResponse> {
        Cache::builder().max_capacity(MAX_ENTRIES_PER_TAG).time_to_live(self.ttl).build()
    }

    /// Handle to the live entries of `tag` and their generation.
    fn entries(&self, tag: &str) -> (u64, Cache<String, CachedResponse>) {
        {
            let buckets = self.buckets.read();
            if let Some(bucket) = buckets.get(tag) {
                return (bucket.generation, bucket.entries.clone());
            }
        }
        let mut buckets = self.buckets.write();
        let bucket = buckets
            .entry(tag.to_string())
            .or_insert_with(|| Bucket { generation: 0, entries: self.empty() });
        (bucket.generation, bucket.entries.clone())
    }

    pub async fn get(&self, tag: &str, key: &str) -> Option<CachedResponse> {
        let (_, entries) = self.entries(tag);
        entries.get(key).await
    }

    /// Current generation of `tag`, to be handed back to [`OutputCache::put`].
    pub fn generation(&self, tag: &str) -> u64 {
        self.entries(tag).0
    }

    pub async fn put(
        &self,
        tag: &str,
        generation: u64,
        key: String,
        response: CachedResponse,
    ) -> bool {
        let (current, entries) = self.entries(tag);
        if current != generation {
            return false;
        }
        // An invalidation racing this insert swaps `entries` out, so the
        // stale value lands in a cache nobody reads.
        entries.insert(key, response).await;
        true
    }
}

impl CacheInvalidator for OutputCache {
    fn invalidate(&self, tag: &str) {
        let entries = self.empty();
        let mut buckets = self.buckets.write();
        let bucket = buckets
            .entry(tag.to_string())
            .or_insert_with(|| Bucket { generation: 0, entries: entries.clone() });
        bucket.generation += 1;
        bucket.entries = entries;
        debug!(tag, generation = bucket.generation, "output cache invalidated");
    }
}

/// Middleware state: which cache and which tag a route belongs to.
#[derive(Clone)]
pub struct CacheScope {
    pub cache: OutputCache,
    pub tag: &'static str,
}

impl CacheScope {
    pub fn new(cache: &OutputCache, tag: &'static str) -> Self {
        Self { cache: cache.clone(), tag }
    }
}

/// Serves and stores `200 OK` answers to anonymous `GET` requests.
pub async fn output_cache(State(scope): State<CacheScope>, req: Request, next: Next) -> Response {
    if req.method() != Method::GET || req.headers().contains_key(AUTHORIZATION) {
        return next.run(req).await;
    }

    let key = req.uri().to_string();
    if let Some(hit) = scope.cache.get(scope.tag, &key).await {
        debug!(tag = scope.tag, key = %key, "output cache hit");
        return hit.into_response();
    }

    let generation = scope.cache.generation(scope.tag);
    let response = next.run(req).await;
    if response.status() != StatusCode::OK {
        return response;
    }

    let (parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, MAX_CACHED_BODY).await {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!(tag = scope.tag, key = %key, error = %err, "failed to buffer response");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        },
    };

    let cached =
        CachedResponse { status: parts.status, headers: parts.headers.clone(), body: bytes.clone() };
    scope.cache.put(scope.tag, generation, key, cached).await;

    Response::from_parts(parts, Body::from(bytes))
}
