//! Synchronous client SDK for a restaurant point-of-sale REST API.
//!
//! # Overview
//! `PosClient` exposes one accessor per API resource; each accessor builds a
//! thin resource object that issues HTTP calls through a caller-supplied
//! [`Transport`]. The interesting state lives in two places:
//!
//! - [`LazyCollection`] wraps list responses and converts raw records to
//!   typed ones only when accessed, memoizing results and derived views.
//! - [`ResponseCache`] remembers decoded read responses for a bounded time so
//!   repeated reads cost no network round-trip.
//!
//! # Design
//! - The core performs no I/O: the [`Transport`] trait is the single
//!   suspension point, implemented by the caller (the integration tests use
//!   ureq against the mock server).
//! - All operations are synchronous and fail fast with [`ApiError`]; nothing
//!   is retried or suppressed internally.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod cache;
pub mod client;
pub mod collection;
pub mod error;
pub mod http;
pub mod resources;
pub mod types;
pub mod validate;

pub use cache::{Clock, ResponseCache, SystemClock};
pub use client::{ClientConfig, PosClient, DEFAULT_CACHE_TTL};
pub use collection::{LazyCollection, RawRecord, Record};
pub use error::{ApiError, MaterializationError};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport};
pub use types::{
    Category, CreateCategory, CreateOrder, CreateProduct, Order, OrderLine, OrderStatus, Product,
    UpdateOrder, UpdateProduct,
};
pub use validate::sanitize_key;
