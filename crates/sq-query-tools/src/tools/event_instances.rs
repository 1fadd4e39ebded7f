//! `detect_event_instances`: records where a field equals a trigger value.

use serde_json::{Value, json};

use sq_protocol::{Scalar, TelemetryLog};

use super::{field_rows, field_schema};
use crate::error::QueryResult;
use crate::types::{QueryTool, ToolArgs, ToolName};

pub struct DetectEventInstances;

impl QueryTool for DetectEventInstances {
    fn name(&self) -> ToolName {
        ToolName::DetectEventInstances
    }

    fn description(&self) -> &str {
        "Find records where a field exactly equals a trigger value"
    }

    fn parameters_schema(&self) -> Value {
        field_schema(
            json!({
                "trigger_value": {
                    "description": "Value to match (default 1)"
                }
            }),
            &[],
        )
    }

    fn execute(&self, args: &Value, log: &TelemetryLog) -> QueryResult<Value> {
        let args = ToolArgs::new(args);
        let field = args.field()?;
        let messages = args.message_types()?;
        let trigger = args.scalar_or("trigger_value", Scalar::Int(1));

        let events: Vec<Value> = field_rows(log, &field, &messages)
            .filter(|(_, _, v)| **v == trigger)
            .map(|(msg, row, _)| {
                json!({ "time": row.time_us(), "message_type": msg, "condition_met": true })
            })
            .collect();

        Ok(json!({ "event_instances": events }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sq_evidence::fixtures;

    #[test]
    fn default_trigger_is_one() {
        let log = fixtures::sample_flight_log();
        let out = DetectEventInstances
            .execute(&json!({"field": "status", "message_types": ["gps"]}), &log)
            .unwrap();
        assert_eq!(
            out["event_instances"],
            json!([{"time": 4_000_000, "message_type": "gps", "condition_met": true}])
        );
    }

    #[test]
    fn numeric_trigger_matches_across_int_and_float() {
        let log = fixtures::sample_flight_log();
        let out = DetectEventInstances
            .execute(
                &json!({"field": "alt", "message_types": ["gps"], "trigger_value": 12.0}),
                &log,
            )
            .unwrap();
        assert_eq!(out["event_instances"].as_array().unwrap().len(), 2);
    }
}
