//! anomaly_detection: the lowest and highest numeric values per message
//! type, as candidates for the oracle to judge.

use sq_protocol::{Evidence, Observation, TelemetryLog};

use super::field_values;

/// Candidates taken from each end of the value-sorted series.
pub const PER_SIDE: usize = 5;

/// Rank-based extremes sampler. Message types with fewer than two numeric
/// values are skipped; series of up to `2 * PER_SIDE` values are returned
/// whole rather than repeating rows on both sides.
pub fn anomalies(field: Option<&str>, messages: &[String], log: &TelemetryLog) -> Evidence {
    let mut found = Vec::new();

    for msg in messages {
        let mut values: Vec<_> = field_values(log.records(msg), field)
            .filter_map(|(row, v)| v.as_f64().map(|n| (row, v, n)))
            .collect();
        if values.len() < 2 {
            continue;
        }
        values.sort_by(|a, b| a.2.total_cmp(&b.2));

        let picked: Vec<_> = if values.len() <= 2 * PER_SIDE {
            values
        } else {
            let top = values.len() - PER_SIDE;
            values
                .into_iter()
                .enumerate()
                .filter(|(i, _)| *i < PER_SIDE || *i >= top)
                .map(|(_, v)| v)
                .collect()
        };

        found.extend(picked.into_iter().map(|(row, value, _)| Observation {
            message_type: msg.clone(),
            value: value.rounded(),
            time: row.time_us(),
            full_row: row.rounded(),
        }));
    }

    Evidence::Anomalies(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use sq_protocol::{Record, Scalar};

    #[test]
    fn takes_both_ends_of_long_series() {
        let rows = (0..50)
            .map(|i| Record::from_fields([("timeus", Scalar::Int(i)), ("roll", Scalar::Int((i * 7) % 50))]))
            .collect();
        let log = TelemetryLog::new([("att", rows)]);
        let Evidence::Anomalies(found) = anomalies(Some("roll"), &["att".to_string()], &log) else {
            panic!("expected anomalies");
        };
        assert_eq!(found.len(), 2 * PER_SIDE);
        let values: Vec<f64> = found.iter().filter_map(|o| o.value.as_f64()).collect();
        assert_eq!(values, vec![0.0, 1.0, 2.0, 3.0, 4.0, 45.0, 46.0, 47.0, 48.0, 49.0]);
    }

    #[test]
    fn short_series_returned_sorted_without_repeats() {
        let log = fixtures::sample_flight_log();
        let Evidence::Anomalies(found) = anomalies(Some("alt"), &["gps".to_string()], &log) else {
            panic!("expected anomalies");
        };
        assert_eq!(found.len(), 6);
        assert_eq!(found[0].value, Scalar::Int(3));
        assert_eq!(found[5].value, Scalar::Int(12));
    }

    #[test]
    fn single_numeric_value_is_skipped() {
        let log = TelemetryLog::new([(
            "bat",
            vec![
                Record::from_fields([("volt", Scalar::Float(12.0))]),
                Record::from_fields([("volt", "low".into())]),
            ],
        )]);
        assert!(anomalies(Some("volt"), &["bat".to_string()], &log).is_empty());
    }
}
