//! time_duration: span between the first and last timestamp per message type.

use sq_protocol::{DurationSpan, Evidence, TIME_FIELD, TelemetryLog, round4};

/// One span per message type with at least one timestamped qualifying
/// record. Without a field every timestamped record qualifies.
pub fn durations(field: Option<&str>, messages: &[String], log: &TelemetryLog) -> Evidence {
    let field = field.unwrap_or(TIME_FIELD);
    let mut spans = Vec::new();

    for msg in messages {
        let stamps = log
            .records(msg)
            .iter()
            .filter(|row| row.contains(field))
            .filter_map(|row| row.time_us());

        let bounds = stamps.fold(None, |acc: Option<(i64, i64)>, t| match acc {
            None => Some((t, t)),
            Some((lo, hi)) => Some((lo.min(t), hi.max(t))),
        });

        if let Some((start_time, end_time)) = bounds {
            let duration_us = end_time - start_time;
            spans.push(DurationSpan {
                message_type: msg.clone(),
                start_time,
                end_time,
                duration_us,
                duration_s: round4(duration_us as f64 / 1e6).unwrap_or_default(),
            });
        }
    }

    Evidence::Durations(spans)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sq_protocol::{Record, Scalar};

    fn spans(evidence: Evidence) -> Vec<DurationSpan> {
        match evidence {
            Evidence::Durations(v) => v,
            other => panic!("expected durations, got {other:?}"),
        }
    }

    #[test]
    fn span_over_unsorted_records() {
        let log = TelemetryLog::new([(
            "gps",
            vec![
                Record::from_fields([("timeus", Scalar::Int(3000)), ("alt", Scalar::Int(3))]),
                Record::from_fields([("timeus", Scalar::Int(1000)), ("alt", Scalar::Int(5))]),
                Record::from_fields([("timeus", Scalar::Int(2000))]),
            ],
        )]);
        let s = spans(durations(Some("alt"), &["gps".to_string()], &log));
        assert_eq!(s[0].start_time, 1000);
        assert_eq!(s[0].end_time, 3000);
        assert_eq!(s[0].duration_us, 2000);
    }

    #[test]
    fn untimed_message_type_is_skipped() {
        let log = TelemetryLog::new([("mode", vec![Record::from_fields([("name", "auto".into())])])]);
        assert!(durations(None, &["mode".to_string()], &log).is_empty());
    }
}
