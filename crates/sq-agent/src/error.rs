use thiserror::Error;

/// Failures talking to a chat model over HTTP. Never retried.
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("oracle transport error: {0}")]
    Transport(String),

    #[error("oracle returned HTTP {0}")]
    Status(u16),

    #[error("oracle response body invalid: {0}")]
    Body(String),

    #[error("oracle request timed out")]
    Timeout,
}

impl From<reqwest::Error> for OracleError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_decode() {
            Self::Body(e.to_string())
        } else {
            Self::Transport(e.to_string())
        }
    }
}

/// Fatal agent-loop failures. Budget exhaustion and empty tool batches are
/// outcomes, not errors.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The oracle replied with something other than the three allowed shapes.
    #[error("oracle protocol violation: {0}")]
    Protocol(String),

    #[error(transparent)]
    Oracle(#[from] OracleError),
}

pub type AgentResult<T> = Result<T, AgentError>;
