//! Evidence engine error types.

use thiserror::Error;

/// Errors that can occur while loading a field catalog.
///
/// Dispatch itself never fails; these only surface at construction time.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("invalid catalog: {0}")]
    Parse(String),

    #[error("catalog not found: {0}")]
    NotFound(String),
}

/// Convenience alias for catalog results.
pub type CatalogResult<T> = Result<T, CatalogError>;
