//! Error types for the POS API client.
//!
//! # Design
//! `NotFound` gets a dedicated variant because callers frequently distinguish
//! "the resource does not exist" from "the server returned an unexpected
//! status." All other non-2xx responses land in `Http` with the raw status
//! code and body for debugging. Materialization failures carry their own type
//! so collection signatures stay narrow and callers can retry after fixing
//! the underlying data source.

use thiserror::Error;

/// Errors returned by `PosClient` and the collection layer.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server returned 404 — the requested resource does not exist.
    #[error("resource not found")]
    NotFound,

    /// The server returned a non-2xx status other than 404.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The transport failed before a response was produced.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The response body could not be deserialized into the expected shape.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// A raw record could not be converted to its typed form.
    #[error(transparent)]
    Materialization(#[from] MaterializationError),

    /// A caller-supplied key failed sanitization before query construction.
    #[error("invalid key: {0}")]
    InvalidKey(String),
}

/// A raw record failed to convert to a typed record (shape mismatch).
///
/// The failing slot is left un-materialized; a later access re-attempts the
/// conversion rather than replaying a cached failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("record at index {index} failed to materialize: {reason}")]
pub struct MaterializationError {
    pub index: usize,
    pub reason: String,
}
