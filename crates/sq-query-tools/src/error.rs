//! Query tool error types.

use thiserror::Error;

/// Errors raised while executing a single query tool.
///
/// The registry converts every variant into an `{"error": ...}` result
/// slot; none of them abort a batch.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("invalid arguments: {0}")]
    Arguments(String),

    /// Nothing usable to compute over. Reported verbatim to the oracle.
    #[error("{0}")]
    NoData(String),

    #[error("could not convert value to float: {0}")]
    Coercion(String),

    #[error("{0}")]
    Other(String),
}

impl QueryError {
    /// Result-slot payload for this error.
    pub fn to_slot(&self) -> serde_json::Value {
        let message = match self {
            Self::NoData(msg) => msg.clone(),
            other => format!("Exception during tool execution: {other}"),
        };
        serde_json::json!({ "error": message })
    }
}

/// Convenience alias for query tool results.
pub type QueryResult<T> = Result<T, QueryError>;
