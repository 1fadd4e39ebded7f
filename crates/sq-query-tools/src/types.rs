//! Tool names, the QueryTool trait, and argument access.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

use sq_protocol::{ParseEnumError, Scalar, TelemetryLog};

use crate::error::{QueryError, QueryResult};

// ── Tool Name ─────────────────────────────────────────────────

/// Closed set of tools the answer oracle may call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolName {
    SummarizeField,
    GetChangePoints,
    GetValuesNearTime,
    ComputeDurationAboveThreshold,
    HighlightAnomalies,
    ListPossibleFields,
    ResampleEvidence,
    DetectEventInstances,
}

impl ToolName {
    pub const ALL: [ToolName; 8] = [
        Self::SummarizeField,
        Self::GetChangePoints,
        Self::GetValuesNearTime,
        Self::ComputeDurationAboveThreshold,
        Self::HighlightAnomalies,
        Self::ListPossibleFields,
        Self::ResampleEvidence,
        Self::DetectEventInstances,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SummarizeField => "summarize_field",
            Self::GetChangePoints => "get_change_points",
            Self::GetValuesNearTime => "get_values_near_time",
            Self::ComputeDurationAboveThreshold => "compute_duration_above_threshold",
            Self::HighlightAnomalies => "highlight_anomalies",
            Self::ListPossibleFields => "list_possible_fields",
            Self::ResampleEvidence => "resample_evidence",
            Self::DetectEventInstances => "detect_event_instances",
        }
    }
}

impl std::fmt::Display for ToolName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolName {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ParseEnumError::new("tool", s))
    }
}

// ── QueryTool Trait ───────────────────────────────────────────

/// A pure query over the telemetry log, invoked by name.
pub trait QueryTool: Send + Sync {
    fn name(&self) -> ToolName;

    /// Human-readable description, shown to the answer oracle.
    fn description(&self) -> &str;

    /// JSON Schema describing accepted arguments.
    fn parameters_schema(&self) -> Value;

    /// Run against the log. Never mutates it.
    fn execute(&self, args: &Value, log: &TelemetryLog) -> QueryResult<Value>;
}

// ── Arguments ─────────────────────────────────────────────────

/// Typed view over a tool call's JSON arguments.
#[derive(Debug, Clone, Copy)]
pub struct ToolArgs<'a> {
    args: &'a Value,
}

impl<'a> ToolArgs<'a> {
    pub fn new(args: &'a Value) -> Self {
        Self { args }
    }

    fn get(&self, key: &str) -> Option<&'a Value> {
        self.args.get(key).filter(|v| !v.is_null())
    }

    fn missing(key: &str) -> QueryError {
        QueryError::Arguments(format!("missing argument '{key}'"))
    }

    pub fn str(&self, key: &str) -> QueryResult<&'a str> {
        let value = self.get(key).ok_or_else(|| Self::missing(key))?;
        value
            .as_str()
            .ok_or_else(|| QueryError::Arguments(format!("'{key}' must be a string")))
    }

    /// The `field` argument, lower-cased to match record keys.
    pub fn field(&self) -> QueryResult<String> {
        self.str("field").map(str::to_lowercase)
    }

    pub fn message_types(&self) -> QueryResult<Vec<String>> {
        let value = self
            .get("message_types")
            .ok_or_else(|| Self::missing("message_types"))?;
        let items = value
            .as_array()
            .ok_or_else(|| QueryError::Arguments("'message_types' must be a list".into()))?;
        items
            .iter()
            .map(|v| {
                v.as_str().map(str::to_lowercase).ok_or_else(|| {
                    QueryError::Arguments(format!("message type {v} is not a string"))
                })
            })
            .collect()
    }

    pub fn f64(&self, key: &str) -> QueryResult<f64> {
        let value = self.get(key).ok_or_else(|| Self::missing(key))?;
        Scalar::from_json(value)
            .coerce_f64()
            .ok_or_else(|| QueryError::Coercion(value.to_string()))
    }

    pub fn f64_or(&self, key: &str, default: f64) -> QueryResult<f64> {
        match self.get(key) {
            Some(_) => self.f64(key),
            None => Ok(default),
        }
    }

    pub fn i64(&self, key: &str) -> QueryResult<i64> {
        self.f64(key).map(|v| v as i64)
    }

    pub fn i64_or(&self, key: &str, default: i64) -> QueryResult<i64> {
        match self.get(key) {
            Some(_) => self.i64(key),
            None => Ok(default),
        }
    }

    pub fn scalar_or(&self, key: &str, default: Scalar) -> Scalar {
        self.get(key).map(Scalar::from_json).unwrap_or(default)
    }

    pub fn list(&self, key: &str) -> QueryResult<&'a [Value]> {
        let value = self.get(key).ok_or_else(|| Self::missing(key))?;
        value
            .as_array()
            .map(Vec::as_slice)
            .ok_or_else(|| QueryError::Arguments(format!("'{key}' must be a list")))
    }
}
