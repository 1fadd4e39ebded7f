//! `highlight_anomalies`: z-score outliers over the merged numeric series.

use serde_json::{Value, json};

use sq_protocol::TelemetryLog;

use super::{field_rows, field_schema, mean_std};
use crate::error::QueryResult;
use crate::types::{QueryTool, ToolArgs, ToolName};

pub const DEFAULT_Z_THRESHOLD: f64 = 3.0;

pub struct HighlightAnomalies;

impl QueryTool for HighlightAnomalies {
    fn name(&self) -> ToolName {
        ToolName::HighlightAnomalies
    }

    fn description(&self) -> &str {
        "Flag values more than z_thresh standard deviations from the mean"
    }

    fn parameters_schema(&self) -> Value {
        field_schema(
            json!({
                "z_thresh": {
                    "type": "number",
                    "description": "Z-score threshold (default 3.0)"
                }
            }),
            &[],
        )
    }

    fn execute(&self, args: &Value, log: &TelemetryLog) -> QueryResult<Value> {
        let args = ToolArgs::new(args);
        let field = args.field()?;
        let messages = args.message_types()?;
        let z = args.f64_or("z_thresh", DEFAULT_Z_THRESHOLD)?;

        let series: Vec<(&str, Option<i64>, f64)> = field_rows(log, &field, &messages)
            .filter_map(|(msg, row, v)| v.coerce_f64().map(|n| (msg, row.time_us(), n)))
            .collect();
        let values: Vec<f64> = series.iter().map(|(_, _, v)| *v).collect();

        let Some((mean, std)) = mean_std(&values) else {
            return Ok(json!({ "anomalies_found": 0, "anomalies": [] }));
        };

        let anomalies: Vec<Value> = series
            .iter()
            .filter(|(_, _, v)| (v - mean).abs() > z * std)
            .map(|(msg, time, v)| json!({ "time": time, "value": v, "message_type": msg }))
            .collect();

        Ok(json!({ "anomalies_found": anomalies.len(), "anomalies": anomalies }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sq_protocol::{Record, Scalar};

    fn spiky_log() -> TelemetryLog {
        let mut rows: Vec<Record> = (0..20)
            .map(|i| Record::from_fields([("timeus", Scalar::Int(i * 1000)), ("roll", Scalar::Float(1.0))]))
            .collect();
        rows.push(Record::from_fields([
            ("timeus", Scalar::Int(99_000)),
            ("roll", Scalar::Float(45.0)),
        ]));
        TelemetryLog::new([("att", rows)])
    }

    #[test]
    fn flags_the_spike() {
        let out = HighlightAnomalies
            .execute(&json!({"field": "roll", "message_types": ["att"]}), &spiky_log())
            .unwrap();
        assert_eq!(out["anomalies_found"], 1);
        assert_eq!(out["anomalies"][0]["time"], 99_000);
        assert_eq!(out["anomalies"][0]["value"], 45.0);
    }

    #[test]
    fn high_threshold_flags_nothing() {
        let out = HighlightAnomalies
            .execute(
                &json!({"field": "roll", "message_types": ["att"], "z_thresh": 50}),
                &spiky_log(),
            )
            .unwrap();
        assert_eq!(out["anomalies_found"], 0);
    }

    #[test]
    fn empty_series_is_not_an_error() {
        let out = HighlightAnomalies
            .execute(&json!({"field": "roll", "message_types": ["gps"]}), &spiky_log())
            .unwrap();
        assert_eq!(out, json!({"anomalies_found": 0, "anomalies": []}));
    }
}
