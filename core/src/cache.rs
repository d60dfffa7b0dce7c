//! Request-level response cache.
//!
//! # Design
//! A short-lived, key-addressed store of prior successful read results, owned
//! by exactly one client instance. Entries are keyed by the literal
//! `(endpoint, canonically serialized params)` pair rather than a hash
//! digest, so two distinct requests can never collide. Expiry is checked on
//! read; a stale entry is evicted by the lookup that finds it. There is no
//! background sweep, which is acceptable for a request-scoped client; a
//! long-lived process reusing one cache should bound its size first.
//!
//! Time is read through the [`Clock`] trait so TTL boundaries are testable
//! without sleeping.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde_json::Value;

/// Source of monotonic time for expiry decisions.
pub trait Clock {
    fn now(&self) -> Instant;
}

/// Real system clock. Use in production code.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Identity of one read request: endpoint plus its parameters in canonical
/// order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    endpoint: String,
    params: String,
}

impl CacheKey {
    fn new(endpoint: &str, params: &[(String, String)]) -> Self {
        Self { endpoint: endpoint.to_string(), params: canonical_params(params) }
    }
}

/// Sort parameters so equivalent requests produce the same key regardless of
/// argument order.
fn canonical_params(params: &[(String, String)]) -> String {
    let mut pairs: Vec<String> = params.iter().map(|(k, v)| format!("{k}={v}")).collect();
    pairs.sort();
    pairs.join("&")
}

#[derive(Debug, Clone)]
struct CacheEntry {
    payload: Value,
    expires_at: Instant,
}

/// Time-bounded store of decoded read responses.
///
/// Consulted before a read hits the transport and populated after one
/// succeeds. Write operations never touch it; the only bulk invalidation is
/// [`ResponseCache::clear`].
#[derive(Debug)]
pub struct ResponseCache<C: Clock = SystemClock> {
    entries: HashMap<CacheKey, CacheEntry>,
    clock: C,
}

impl ResponseCache<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for ResponseCache<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> ResponseCache<C> {
    /// Build a cache reading time from a custom clock (for testing).
    pub fn with_clock(clock: C) -> Self {
        Self { entries: HashMap::new(), clock }
    }

    /// The payload stored for this request, if present and not yet expired.
    /// An expired entry is evicted here and reported as absence.
    pub fn lookup(&mut self, endpoint: &str, params: &[(String, String)]) -> Option<Value> {
        let key = CacheKey::new(endpoint, params);
        match self.entries.get(&key) {
            Some(entry) if self.clock.now() < entry.expires_at => {
                tracing::debug!(endpoint, "response cache hit");
                Some(entry.payload.clone())
            }
            Some(_) => {
                tracing::debug!(endpoint, "response cache entry expired");
                self.entries.remove(&key);
                None
            }
            None => {
                tracing::trace!(endpoint, "response cache miss");
                None
            }
        }
    }

    /// Insert or overwrite the entry for this request, valid for `ttl` from
    /// now.
    pub fn store(&mut self, endpoint: &str, params: &[(String, String)], payload: Value, ttl: Duration) {
        let key = CacheKey::new(endpoint, params);
        let expires_at = self.clock.now() + ttl;
        self.entries.insert(key, CacheEntry { payload, expires_at });
        tracing::trace!(endpoint, ttl_secs = ttl.as_secs(), "response cached");
    }

    /// Drop every entry unconditionally.
    pub fn clear(&mut self) {
        self.entries.clear();
        tracing::debug!("response cache cleared");
    }

    /// Number of live entries, expired or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
