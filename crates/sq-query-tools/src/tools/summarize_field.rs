//! `summarize_field`: min/max/mean/std over a field's numeric values.

use serde_json::{Value, json};

use sq_protocol::TelemetryLog;

use super::{field_rows, field_schema, mean_std};
use crate::error::{QueryError, QueryResult};
use crate::types::{QueryTool, ToolArgs, ToolName};

pub struct SummarizeField;

impl QueryTool for SummarizeField {
    fn name(&self) -> ToolName {
        ToolName::SummarizeField
    }

    fn description(&self) -> &str {
        "Compute min, max, mean and standard deviation of a field"
    }

    fn parameters_schema(&self) -> Value {
        field_schema(json!({}), &[])
    }

    fn execute(&self, args: &Value, log: &TelemetryLog) -> QueryResult<Value> {
        let args = ToolArgs::new(args);
        let field = args.field()?;
        let messages = args.message_types()?;

        // Values that cannot be read as numbers are skipped.
        let values: Vec<f64> = field_rows(log, &field, &messages)
            .filter_map(|(_, _, v)| v.coerce_f64())
            .collect();

        let Some((mean, std)) = mean_std(&values) else {
            return Err(QueryError::NoData(format!(
                "No valid values found for field '{field}' in messages {messages:?}"
            )));
        };
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        Ok(json!({ "min": min, "max": max, "mean": mean, "std": std }))
    }
}
