//! `get_values_near_time`: all records within a tolerance of a timestamp.

use serde_json::{Value, json};

use sq_protocol::TelemetryLog;

use super::{field_rows, field_schema};
use crate::error::QueryResult;
use crate::types::{QueryTool, ToolArgs, ToolName};

pub const DEFAULT_TOLERANCE_US: i64 = 1_000_000;

pub struct GetValuesNearTime;

impl QueryTool for GetValuesNearTime {
    fn name(&self) -> ToolName {
        ToolName::GetValuesNearTime
    }

    fn description(&self) -> &str {
        "Get a field's values recorded within a tolerance of a timestamp"
    }

    fn parameters_schema(&self) -> Value {
        field_schema(
            json!({
                "query_time_us": {
                    "type": "integer",
                    "description": "Timestamp in microseconds"
                },
                "tolerance": {
                    "type": "integer",
                    "description": "Allowed distance in microseconds (default 1000000)"
                }
            }),
            &["query_time_us"],
        )
    }

    fn execute(&self, args: &Value, log: &TelemetryLog) -> QueryResult<Value> {
        let args = ToolArgs::new(args);
        let field = args.field()?;
        let messages = args.message_types()?;
        let at = args.i64("query_time_us")?;
        let tolerance = args.i64_or("tolerance", DEFAULT_TOLERANCE_US)?;

        let matched: Vec<Value> = field_rows(log, &field, &messages)
            .filter_map(|(msg, row, value)| {
                let time = row.time_us()?;
                (time.abs_diff(at) <= tolerance.unsigned_abs()).then(|| {
                    json!({ "time": time, "value": value, "message_type": msg })
                })
            })
            .collect();

        Ok(json!({ "matched_rows": matched }))
    }
}
