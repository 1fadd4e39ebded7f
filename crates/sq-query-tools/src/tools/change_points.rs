//! `get_change_points`: every point where a field's value changes.

use serde_json::{Value, json};

use sq_protocol::{Scalar, TelemetryLog};

use super::field_schema;
use crate::error::QueryResult;
use crate::types::{QueryTool, ToolArgs, ToolName};

pub struct GetChangePoints;

impl QueryTool for GetChangePoints {
    fn name(&self) -> ToolName {
        ToolName::GetChangePoints
    }

    fn description(&self) -> &str {
        "List every time a field changes value, without a cap"
    }

    fn parameters_schema(&self) -> Value {
        field_schema(json!({}), &[])
    }

    /// The running previous value restarts with each message type; the
    /// resulting lists are concatenated.
    fn execute(&self, args: &Value, log: &TelemetryLog) -> QueryResult<Value> {
        let args = ToolArgs::new(args);
        let field = args.field()?;
        let messages = args.message_types()?;

        let mut points = Vec::new();
        for msg in &messages {
            let mut last: Option<&Scalar> = None;
            for row in log.records(msg) {
                let Some(value) = row.get(&field) else {
                    continue;
                };
                if let Some(prev) = last.filter(|p| !p.is_null()) {
                    if value != prev {
                        points.push(json!({
                            "time": row.time_us(),
                            "value": value,
                            "message_type": msg,
                        }));
                    }
                }
                last = Some(value);
            }
        }

        Ok(json!({ "change_points": points }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sq_evidence::fixtures;
    use sq_protocol::Record;

    #[test]
    fn lists_changes_with_time() {
        let log = fixtures::sample_flight_log();
        let out = GetChangePoints
            .execute(&json!({"field": "status", "message_types": ["gps"]}), &log)
            .unwrap();
        let points = out["change_points"].as_array().unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0], json!({"time": 4_000_000, "value": 1, "message_type": "gps"}));
    }

    #[test]
    fn previous_value_resets_per_message_type() {
        let log = TelemetryLog::new([
            ("a", vec![Record::from_fields([("mode", Scalar::Int(1))])]),
            ("b", vec![Record::from_fields([("mode", Scalar::Int(2))])]),
        ]);
        let out = GetChangePoints
            .execute(&json!({"field": "mode", "message_types": ["a", "b"]}), &log)
            .unwrap();
        assert!(out["change_points"].as_array().unwrap().is_empty());
    }
}
