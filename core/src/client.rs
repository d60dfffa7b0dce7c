//! POS API client: transport ownership, response caching, status mapping.
//!
//! # Design
//! `PosClient` owns a [`Transport`] and one [`ResponseCache`]. Every
//! idempotent read goes through the cache path: lookup first, execute on a
//! miss, store on success. Writes never consult or populate the cache, and
//! they perform no implicit invalidation either: a caller that knows a write
//! shadows prior reads calls [`PosClient::clear_cache`]. Each CRUD operation
//! is split into a `build_*` step that produces an `HttpRequest` and a parse
//! step that consumes the `HttpResponse`, keeping the I/O boundary explicit.

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

use crate::cache::{Clock, ResponseCache, SystemClock};
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport};
use crate::resources::{Categories, Orders, Products};

/// Default lifetime of a cached read response.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Client construction parameters.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub cache_ttl: Duration,
    pub cache_enabled: bool,
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            cache_ttl: DEFAULT_CACHE_TTL,
            cache_enabled: true,
        }
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn without_cache(mut self) -> Self {
        self.cache_enabled = false;
        self
    }
}

/// Synchronous client for the POS API.
///
/// Resource accessors construct thin resource objects on demand; the heavy
/// lifting (cache consultation, transport execution, status mapping) lives
/// here so every resource behaves identically.
pub struct PosClient<T: Transport, C: Clock = SystemClock> {
    config: ClientConfig,
    transport: T,
    cache: ResponseCache<C>,
}

impl<T: Transport> PosClient<T> {
    pub fn new(config: ClientConfig, transport: T) -> Self {
        Self::with_clock(config, transport, SystemClock)
    }
}

impl<T: Transport, C: Clock> PosClient<T, C> {
    /// Build a client whose cache reads time from a custom clock (testing).
    pub fn with_clock(config: ClientConfig, transport: T, clock: C) -> Self {
        Self { config, transport, cache: ResponseCache::with_clock(clock) }
    }

    /// Drop every cached read response. The only bulk invalidation; call it
    /// after a write known to affect prior reads.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Menu products resource.
    pub fn products(&mut self) -> Products<'_, T, C> {
        Products::new(self)
    }

    /// Menu categories resource.
    pub fn categories(&mut self) -> Categories<'_, T, C> {
        Categories::new(self)
    }

    /// Orders resource.
    pub fn orders(&mut self) -> Orders<'_, T, C> {
        Orders::new(self)
    }

    /// Cache-aware GET returning the decoded body.
    pub(crate) fn get_json(&mut self, path: &str, params: &[(String, String)]) -> Result<Value, ApiError> {
        let endpoint = format!("GET {path}");
        if self.config.cache_enabled {
            if let Some(payload) = self.cache.lookup(&endpoint, params) {
                return Ok(payload);
            }
        }

        let request = self.build_get(path, params);
        tracing::debug!(path, "executing read");
        let response = self.transport.execute(&request)?;
        check_status(&response, 200)?;
        let payload = decode_json(&response)?;

        if self.config.cache_enabled {
            let ttl = self.config.cache_ttl;
            self.cache.store(&endpoint, params, payload.clone(), ttl);
        }
        Ok(payload)
    }

    /// Uncached write with an optional JSON body. Returns the raw response
    /// after status checking so callers decide how to parse it.
    pub(crate) fn send<B: Serialize>(
        &mut self,
        method: HttpMethod,
        path: &str,
        body: Option<&B>,
        expected: u16,
    ) -> Result<HttpResponse, ApiError> {
        let body = match body {
            Some(payload) => Some(
                serde_json::to_string(payload).map_err(|e| ApiError::Serialization(e.to_string()))?,
            ),
            None => None,
        };
        let headers = if body.is_some() {
            vec![("content-type".to_string(), "application/json".to_string())]
        } else {
            Vec::new()
        };
        let request =
            HttpRequest { method, path: format!("{}{path}", self.config.base_url), headers, body };

        tracing::debug!(path, ?method, "executing write");
        let response = self.transport.execute(&request)?;
        check_status(&response, expected)?;
        Ok(response)
    }

    fn build_get(&self, path: &str, params: &[(String, String)]) -> HttpRequest {
        let mut url = format!("{}{path}", self.config.base_url);
        if !params.is_empty() {
            let query: Vec<String> = params.iter().map(|(k, v)| format!("{k}={v}")).collect();
            url.push('?');
            url.push_str(&query.join("&"));
        }
        HttpRequest { method: HttpMethod::Get, path: url, headers: Vec::new(), body: None }
    }
}

/// Map non-success status codes to the appropriate `ApiError` variant.
fn check_status(response: &HttpResponse, expected: u16) -> Result<(), ApiError> {
    if response.status == expected {
        return Ok(());
    }
    if response.status == 404 {
        return Err(ApiError::NotFound);
    }
    Err(ApiError::Http { status: response.status, body: response.body.clone() })
}

/// Decode a response body into a JSON value.
fn decode_json(response: &HttpResponse) -> Result<Value, ApiError> {
    serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
}
