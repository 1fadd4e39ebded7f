//! summary: head rows plus per-field samples and numeric aggregates.

use std::collections::BTreeMap;

use sq_protocol::{Evidence, FieldSummary, MessageSummary, NumericStats, TelemetryLog, round4};

pub const SAMPLE_ROWS: usize = 5;
pub const SAMPLE_VALUES: usize = 3;

/// One summary per message type. Fields are taken from the first record;
/// numeric aggregates only cover integer and float values.
pub fn summarize(messages: &[String], log: &TelemetryLog) -> Evidence {
    let mut summary = BTreeMap::new();

    for msg in messages {
        let rows = log.records(msg);
        let Some(first) = rows.first() else {
            summary.insert(
                msg.clone(),
                MessageSummary {
                    entry_count: 0,
                    field_summary: BTreeMap::new(),
                    sample_rows: Vec::new(),
                },
            );
            continue;
        };

        let mut field_summary = BTreeMap::new();
        for field in first.fields() {
            let values: Vec<_> = rows.iter().filter_map(|r| r.get(field)).collect();
            let numeric: Vec<f64> = values.iter().filter_map(|v| v.as_f64()).collect();

            let stats = (!numeric.is_empty()).then(|| {
                let min = numeric.iter().copied().fold(f64::INFINITY, f64::min);
                let max = numeric.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                let mean = numeric.iter().sum::<f64>() / numeric.len() as f64;
                NumericStats {
                    min: round4(min),
                    max: round4(max),
                    mean: round4(mean),
                }
            });

            field_summary.insert(
                field.to_string(),
                FieldSummary {
                    sample_values: values.iter().take(SAMPLE_VALUES).map(|v| v.rounded()).collect(),
                    stats,
                },
            );
        }

        summary.insert(
            msg.clone(),
            MessageSummary {
                entry_count: rows.len(),
                field_summary,
                sample_rows: rows.iter().take(SAMPLE_ROWS).map(|r| r.rounded()).collect(),
            },
        );
    }

    Evidence::Summary(summary)
}
