// CampusHub
// Copyright (C) 2025 Synerthink

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Cache-aside read path
//!
//! Reads check the cache before the data source and populate it after a
//! miss. Consistency with writes is TTL-bounded: entries age out rather
//! than being invalidated per write, matching the listing workloads this
//! serves. Concurrent fillers for one key may race; both run the same
//! idempotent read and the last cache write wins.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use campus_cache::Cache;
use metrics::increment_counter;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::{ApiError, ApiResult};

/// Cache-aside front for data-source queries.
///
/// The cache backend call and the data-source fetch are each bounded by
/// the configured deadline; a deadline hit fails the fetch rather than
/// hanging the request. A cache backend *error* is different: the fetch
/// falls open to the data source, trading the speedup for availability.
pub struct QueryCache {
    cache: Arc<dyn Cache>,
    ttl: Duration,
    deadline: Duration,
}

impl QueryCache {
    /// Create a query cache over a backend
    pub fn new(cache: Arc<dyn Cache>, ttl: Duration, deadline: Duration) -> Self {
        Self { cache, ttl, deadline }
    }

    /// Derive the cache key for a logical query.
    ///
    /// Keys are namespaced by query name and include every parameter that
    /// affects the result, so distinct queries never collide and identical
    /// queries always agree.
    pub fn derive_key(query_name: &str, identity: &str, params: &[&str]) -> String {
        let mut key = format!("{}:{}", query_name, identity);
        for param in params {
            key.push(':');
            key.push_str(param);
        }
        key
    }

    /// Fetch a query result, consulting the cache first.
    ///
    /// On a hit the cached value is returned unchanged. On a miss the
    /// loader runs, its result is cached for the configured TTL, and the
    /// result is returned. Loader errors propagate unchanged and nothing
    /// is cached for them.
    pub async fn fetch<T, F, Fut>(&self, query_name: &str, identity: &str, params: &[&str], loader: F) -> ApiResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = ApiResult<T>>,
    {
        let key = Self::derive_key(query_name, identity, params);

        let cached = match tokio::time::timeout(self.deadline, self.cache.get(&key)).await {
            Err(_) => {
                return Err(ApiError::GatewayTimeout {
                    message: format!("cache lookup timed out for {}", key),
                });
            }
            Ok(Err(e)) => {
                warn!(key = %key, error = %e, "cache read failed, falling back to data source");
                increment_counter!("query_cache_fallback_total", "query" => query_name.to_string());
                None
            }
            Ok(Ok(value)) => value,
        };

        if let Some(bytes) = cached {
            match serde_json::from_slice(&bytes) {
                Ok(value) => {
                    debug!(key = %key, "query cache hit");
                    increment_counter!("query_cache_hits_total", "query" => query_name.to_string());
                    return Ok(value);
                }
                Err(e) => {
                    // Undecodable entry, likely written by an older build.
                    // Treat as a miss and overwrite below.
                    warn!(key = %key, error = %e, "discarding undecodable cache entry");
                }
            }
        }

        increment_counter!("query_cache_misses_total", "query" => query_name.to_string());

        let value = tokio::time::timeout(self.deadline, loader())
            .await
            .map_err(|_| ApiError::GatewayTimeout {
                message: format!("data source timed out for {}", key),
            })??;

        let bytes = serde_json::to_vec(&value)?;
        match tokio::time::timeout(self.deadline, self.cache.set(&key, bytes, self.ttl)).await {
            Err(_) => warn!(key = %key, "cache write timed out, serving uncached result"),
            Ok(Err(e)) => warn!(key = %key, error = %e, "cache write failed, serving uncached result"),
            Ok(Ok(())) => debug!(key = %key, "query cache filled"),
        }

        Ok(value)
    }
}
