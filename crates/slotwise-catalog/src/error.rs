//! Error types for catalog lookups.

use thiserror::Error;

/// Errors from resolving an object reference.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// The catalog has no object with this UUID.
    #[error("object not found: {0}")]
    NotFound(String),

    /// The catalog could not be reached or answered with a failure.
    #[error("catalog unavailable: {0}")]
    Unavailable(String),

    /// Catalog data could not be parsed.
    #[error("invalid catalog data: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;
