//! `resample_evidence`: stride-based down-sampling of an evidence list.

use serde_json::{Value, json};

use sq_protocol::TelemetryLog;

use crate::error::{QueryError, QueryResult};
use crate::types::{QueryTool, ToolArgs, ToolName};

pub const DEFAULT_SAMPLES: i64 = 10;

pub struct ResampleEvidence;

impl QueryTool for ResampleEvidence {
    fn name(&self) -> ToolName {
        ToolName::ResampleEvidence
    }

    fn description(&self) -> &str {
        "Down-sample a list of evidence entries to at most n_samples"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "evidence": {
                    "type": "array",
                    "items": { "type": "object" },
                    "description": "Evidence entries to thin out"
                },
                "n_samples": {
                    "type": "integer",
                    "description": "Maximum entries returned (default 10)"
                }
            },
            "required": ["evidence"]
        })
    }

    fn execute(&self, args: &Value, _log: &TelemetryLog) -> QueryResult<Value> {
        let args = ToolArgs::new(args);
        let evidence = args.list("evidence")?;
        let n = args.i64_or("n_samples", DEFAULT_SAMPLES)?;
        if n < 1 {
            return Err(QueryError::Arguments(format!(
                "'n_samples' must be positive, got {n}"
            )));
        }
        let n = n as usize;

        let step = (evidence.len() / n).max(1);
        let sampled: Vec<&Value> = evidence.iter().step_by(step).take(n).collect();

        Ok(json!({ "resampled_points": sampled.len(), "resampled": sampled }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(n: usize) -> Value {
        Value::Array((0..n).map(|i| json!({ "i": i })).collect())
    }

    #[test]
    fn strides_then_caps() {
        let log = TelemetryLog::default();
        let out = ResampleEvidence
            .execute(&json!({"evidence": entries(25), "n_samples": 10}), &log)
            .unwrap();
        // step = 25 / 10 = 2 → 0,2,4,...,18 after the cap.
        assert_eq!(out["resampled_points"], 10);
        assert_eq!(out["resampled"][1]["i"], 2);
        assert_eq!(out["resampled"][9]["i"], 18);
    }

    #[test]
    fn short_lists_pass_through() {
        let log = TelemetryLog::default();
        let out = ResampleEvidence
            .execute(&json!({"evidence": entries(3)}), &log)
            .unwrap();
        assert_eq!(out["resampled_points"], 3);

        let out = ResampleEvidence.execute(&json!({"evidence": []}), &log).unwrap();
        assert_eq!(out, json!({"resampled_points": 0, "resampled": []}));
    }

    #[test]
    fn zero_samples_rejected() {
        let log = TelemetryLog::default();
        let err = ResampleEvidence
            .execute(&json!({"evidence": entries(3), "n_samples": 0}), &log)
            .unwrap_err();
        assert!(matches!(err, QueryError::Arguments(_)));
    }
}
