//! max_value / min_value: the single extreme value per message type.

use std::cmp::Ordering;

use sq_protocol::{Evidence, Observation, TelemetryLog};

use super::field_values;

/// Which end of the range to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extreme {
    Max,
    Min,
}

impl Extreme {
    fn beats(self, ord: Ordering) -> bool {
        match self {
            Self::Max => ord == Ordering::Greater,
            Self::Min => ord == Ordering::Less,
        }
    }
}

/// One entry per message type holding a comparable value. Ties keep the
/// first occurrence; null and incomparable values are skipped.
pub fn extremes(
    which: Extreme,
    field: Option<&str>,
    messages: &[String],
    log: &TelemetryLog,
) -> Evidence {
    let mut found = Vec::new();

    for msg in messages {
        let mut best = None;
        for (row, value) in field_values(log.records(msg), field) {
            if value.is_null() {
                continue;
            }
            let better = match best {
                None => true,
                Some((_, current)) => value
                    .compare(current)
                    .is_some_and(|ord| which.beats(ord)),
            };
            if better {
                best = Some((row, value));
            }
        }

        if let Some((row, value)) = best {
            found.push(Observation {
                message_type: msg.clone(),
                value: value.rounded(),
                time: row.time_us(),
                full_row: row.rounded(),
            });
        }
    }

    Evidence::Extremes(found)
}
