//! `compute_duration_above_threshold`: time spent with a field above a
//! threshold.

use serde_json::{Value, json};

use sq_protocol::{Record, TelemetryLog};

use super::field_schema;
use crate::error::{QueryError, QueryResult};
use crate::types::{QueryTool, ToolArgs, ToolName};

pub struct ComputeDurationAboveThreshold;

impl QueryTool for ComputeDurationAboveThreshold {
    fn name(&self) -> ToolName {
        ToolName::ComputeDurationAboveThreshold
    }

    fn description(&self) -> &str {
        "Total microseconds during which a field stayed above a threshold"
    }

    fn parameters_schema(&self) -> Value {
        field_schema(
            json!({
                "threshold": {
                    "type": "number",
                    "description": "Value the field must exceed"
                }
            }),
            &["threshold"],
        )
    }

    /// Records are sorted by timestamp (missing = 0). Each record whose
    /// value exceeds the threshold contributes the gap to the next record.
    fn execute(&self, args: &Value, log: &TelemetryLog) -> QueryResult<Value> {
        let args = ToolArgs::new(args);
        let field = args.field()?;
        let messages = args.message_types()?;
        let threshold = args.f64("threshold")?;

        let mut total: i64 = 0;
        for msg in &messages {
            let mut rows: Vec<&Record> = log.records(msg).iter().collect();
            rows.sort_by_key(|r| r.time_us().unwrap_or(0));

            for pair in rows.windows(2) {
                let (prev, curr) = (pair[0], pair[1]);
                let Some(value) = prev.get(&field) else {
                    continue;
                };
                let value = value
                    .coerce_f64()
                    .ok_or_else(|| QueryError::Coercion(format!("{value:?}")))?;
                if value > threshold {
                    let delta = curr.time_us().unwrap_or(0) - prev.time_us().unwrap_or(0);
                    total += delta.max(0);
                }
            }
        }

        Ok(json!({ "duration_above_threshold": total }))
    }
}
