//! Query tools for the SkyQuery agent loop.
//!
//! Eight pure queries over a telemetry log that the answer oracle can
//! request by name: summarize_field, get_change_points,
//! get_values_near_time, compute_duration_above_threshold,
//! highlight_anomalies, list_possible_fields, resample_evidence and
//! detect_event_instances.

pub mod error;
pub mod registry;
pub mod tools;
pub mod types;

pub use error::{QueryError, QueryResult};
pub use registry::{BatchOutcome, ToolInfo, ToolRegistry, ValidationFailure};
pub use types::{QueryTool, ToolArgs, ToolName};
