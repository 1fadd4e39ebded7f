//! event_detection: every point where a field's value changes within a
//! message type.

use sq_protocol::{Evidence, Scalar, TelemetryLog, Transition};

use super::field_values;

/// Transitions per message type, uncapped. A message type whose field never
/// varies is skipped entirely. A null value resets the running previous
/// value, so no transition is reported into or out of it.
pub fn transitions(field: Option<&str>, messages: &[String], log: &TelemetryLog) -> Evidence {
    let mut found = Vec::new();
    let Some(name) = field else {
        return Evidence::Transitions(found);
    };

    for msg in messages {
        let records = log.records(msg);
        let mut values = field_values(records, field).map(|(_, v)| v);
        let Some(first) = values.next() else {
            continue;
        };
        if values.all(|v| v == first) {
            continue;
        }

        let mut prev: Option<&Scalar> = None;
        for (row, current) in field_values(records, field) {
            if let Some(old) = prev.filter(|p| !p.is_null()) {
                if current != old {
                    found.push(Transition {
                        message_type: msg.clone(),
                        field: name.to_string(),
                        old_value: old.rounded(),
                        new_value: current.rounded(),
                        time: row.time_us(),
                        full_row: row.rounded(),
                    });
                }
            }
            prev = Some(current);
        }
    }

    Evidence::Transitions(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use sq_protocol::Record;

    fn found(evidence: Evidence) -> Vec<Transition> {
        match evidence {
            Evidence::Transitions(v) => v,
            other => panic!("expected transitions, got {other:?}"),
        }
    }

    #[test]
    fn reports_each_change() {
        let log = fixtures::sample_flight_log();
        let t = found(transitions(Some("status"), &["gps".to_string()], &log));
        // 3,3,3,1,3,3 → two transitions.
        assert_eq!(t.len(), 2);
        assert_eq!(t[0].old_value, Scalar::Int(3));
        assert_eq!(t[0].new_value, Scalar::Int(1));
        assert_eq!(t[0].time, Some(4_000_000));
        assert_eq!(t[1].new_value, Scalar::Int(3));
        assert_eq!(t[1].field, "status");
    }

    #[test]
    fn constant_field_yields_no_events() {
        let rows = (0..100)
            .map(|i| Record::from_fields([("timeus", Scalar::Int(i)), ("armed", Scalar::Int(1))]))
            .collect();
        let log = TelemetryLog::new([("arm", rows)]);
        let t = found(transitions(Some("armed"), &["arm".to_string()], &log));
        assert!(t.is_empty());
    }

    #[test]
    fn constant_type_skipped_while_varying_type_reported() {
        let log = TelemetryLog::new([
            (
                "a",
                vec![
                    Record::from_fields([("mode", Scalar::Int(1))]),
                    Record::from_fields([("mode", Scalar::Int(1))]),
                ],
            ),
            (
                "b",
                vec![
                    Record::from_fields([("mode", Scalar::Int(1))]),
                    Record::from_fields([("mode", Scalar::Int(2))]),
                ],
            ),
        ]);
        let t = found(transitions(
            Some("mode"),
            &["a".to_string(), "b".to_string()],
            &log,
        ));
        assert_eq!(t.len(), 1);
        assert_eq!(t[0].message_type, "b");
        assert!(t[0].time.is_none());
    }
}
