//! value_at_time: records within a window around a query timestamp.

use sq_protocol::{Availability, Evidence, Record, TelemetryLog, TimedValue};

/// Half-width of the search window around the query time.
pub const WINDOW_US: i64 = 500_000;
/// Closest rows kept per message type.
pub const MAX_PER_MESSAGE: usize = 5;

/// Matches sorted globally by `difference_us`, plus one availability entry
/// per message type explaining what it contributed.
pub fn values_at_time(
    field: Option<&str>,
    messages: &[String],
    log: &TelemetryLog,
    query_time_us: i64,
) -> (Evidence, Vec<Availability>) {
    let mut results = Vec::new();
    let mut report = Vec::with_capacity(messages.len());

    for msg in messages {
        let rows = log.records(msg);
        if rows.is_empty() {
            report.push(Availability::NoData {
                message_type: msg.clone(),
            });
            continue;
        }

        let mut matched: Vec<TimedValue> = rows
            .iter()
            .filter_map(|row| {
                let timestamp = row.time_us()?;
                let (_, value) = row.get_ignore_case(field?)?;
                let difference_us = timestamp.abs_diff(query_time_us);
                (difference_us <= WINDOW_US as u64).then(|| TimedValue {
                    message_type: msg.clone(),
                    value: value.rounded(),
                    timestamp,
                    difference_us: difference_us as i64,
                    full_row: row.rounded(),
                })
            })
            .collect();

        if !matched.is_empty() {
            report.push(Availability::MatchedRows {
                message_type: msg.clone(),
                count: matched.len(),
            });
            matched.sort_by_key(|m| m.difference_us);
            matched.truncate(MAX_PER_MESSAGE);
            results.extend(matched);
            continue;
        }

        report.push(out_of_window(msg, rows, field, query_time_us));
    }

    results.sort_by_key(|m| m.difference_us);
    (Evidence::ValuesAtTime(results), report)
}

fn out_of_window(
    msg: &str,
    rows: &[Record],
    field: Option<&str>,
    query_time_us: i64,
) -> Availability {
    let has_field = field.is_some_and(|f| rows.iter().any(|r| r.get_ignore_case(f).is_some()));

    if has_field {
        let closest = rows
            .iter()
            .filter_map(Record::time_us)
            .min_by_key(|t| t.abs_diff(query_time_us));
        Availability::FieldPresentButOutOfWindow {
            message_type: msg.to_string(),
            closest_timeus: closest,
            time_diff_us: closest.map(|t| t.abs_diff(query_time_us) as i64),
        }
    } else {
        let sample = rows.iter().find(|r| r.time_us().is_some());
        Availability::FieldNotPresent {
            message_type: msg.to_string(),
            available_fields_sample: sample
                .map(|r| r.fields().map(str::to_string).collect())
                .unwrap_or_default(),
        }
    }
}
