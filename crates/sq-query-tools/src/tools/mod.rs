//! Query tool implementations, one per file.

pub mod change_points;
pub mod duration_above_threshold;
pub mod event_instances;
pub mod highlight_anomalies;
pub mod list_fields;
pub mod resample;
pub mod summarize_field;
pub mod values_near_time;

use sq_protocol::{Record, Scalar, TelemetryLog};

use crate::types::{QueryTool, ToolName};

/// The implementation behind a tool name.
pub fn for_name(name: ToolName) -> Box<dyn QueryTool> {
    match name {
        ToolName::SummarizeField => Box::new(summarize_field::SummarizeField),
        ToolName::GetChangePoints => Box::new(change_points::GetChangePoints),
        ToolName::GetValuesNearTime => Box::new(values_near_time::GetValuesNearTime),
        ToolName::ComputeDurationAboveThreshold => {
            Box::new(duration_above_threshold::ComputeDurationAboveThreshold)
        }
        ToolName::HighlightAnomalies => Box::new(highlight_anomalies::HighlightAnomalies),
        ToolName::ListPossibleFields => Box::new(list_fields::ListPossibleFields),
        ToolName::ResampleEvidence => Box::new(resample::ResampleEvidence),
        ToolName::DetectEventInstances => Box::new(event_instances::DetectEventInstances),
    }
}

/// Every tool, in `ToolName::ALL` order.
pub fn all_tools() -> Vec<Box<dyn QueryTool>> {
    ToolName::ALL.into_iter().map(for_name).collect()
}

/// `(message_type, record, value)` for every record carrying `field`,
/// walking message types in the order given.
pub(crate) fn field_rows<'a>(
    log: &'a TelemetryLog,
    field: &'a str,
    messages: &'a [String],
) -> impl Iterator<Item = (&'a str, &'a Record, &'a Scalar)> + 'a {
    messages.iter().flat_map(move |msg| {
        log.records(msg)
            .iter()
            .filter_map(move |row| row.get(field).map(|v| (msg.as_str(), row, v)))
    })
}

/// Population mean and standard deviation. `None` for an empty series.
pub(crate) fn mean_std(values: &[f64]) -> Option<(f64, f64)> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    Some((mean, variance.sqrt()))
}

/// Shared schema for tools taking `field` + `message_types` plus extras.
pub(crate) fn field_schema(extra: serde_json::Value, required_extra: &[&str]) -> serde_json::Value {
    let mut properties = serde_json::json!({
        "field": {
            "type": "string",
            "description": "Field name, e.g. alt"
        },
        "message_types": {
            "type": "array",
            "items": { "type": "string" },
            "description": "Message types to scan (at most 20)"
        }
    });
    if let (Some(props), serde_json::Value::Object(extra)) = (properties.as_object_mut(), extra) {
        props.extend(extra);
    }
    let mut required = vec!["field", "message_types"];
    required.extend_from_slice(required_extra);
    serde_json::json!({
        "type": "object",
        "properties": properties,
        "required": required
    })
}
