//! `list_possible_fields`: every field name that appears in the log.

use serde_json::{Value, json};

use sq_protocol::TelemetryLog;

use crate::error::QueryResult;
use crate::types::{QueryTool, ToolName};

pub struct ListPossibleFields;

impl QueryTool for ListPossibleFields {
    fn name(&self) -> ToolName {
        ToolName::ListPossibleFields
    }

    fn description(&self) -> &str {
        "List every field name present anywhere in the log"
    }

    fn parameters_schema(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    fn execute(&self, _args: &Value, log: &TelemetryLog) -> QueryResult<Value> {
        Ok(json!({ "available_fields": log.field_names() }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sq_evidence::fixtures;

    #[test]
    fn sorted_union_of_fields() {
        let out = ListPossibleFields
            .execute(&json!({}), &fixtures::sample_flight_log())
            .unwrap();
        let fields: Vec<&str> = out["available_fields"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(Value::as_str)
            .collect();
        assert!(fields.windows(2).all(|w| w[0] < w[1]));
        for expected in ["alt", "curr", "ecode", "name", "roll", "timeus", "volt"] {
            assert!(fields.contains(&expected), "missing {expected}");
        }
    }
}
