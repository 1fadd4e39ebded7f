//! SkyQuery agent: answer-oracle loop, intent classification and the
//! question pipeline.
//!
//! Re-exports all modules so external crates (e.g. `sq-e2e-tests`) can
//! drive `QueryPipeline` and `AgentLoop` with scripted oracles.

pub mod agent;
pub mod classifier;
pub mod config;
pub mod error;
pub mod mock;
pub mod oracle;
pub mod pipeline;
pub mod prompt;
pub mod reply;
pub mod session;

pub use agent::AgentLoop;
pub use error::{AgentError, AgentResult, OracleError};
pub use pipeline::QueryPipeline;
