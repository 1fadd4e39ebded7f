//! change_detection: value changes along the merged timeline of all
//! requested message types.

use sq_protocol::{ChangePoint, ChangeSummary, Evidence, Scalar, TelemetryLog};

use super::field_values;

/// Most change points returned; larger sets are down-sampled.
pub const MAX_CHANGES: usize = 30;

/// The previous value is carried across message types in request order,
/// so the concatenation is treated as one stream. Over `MAX_CHANGES`
/// points the list is sorted by time (untimed first) and sampled at evenly
/// spaced indices, keeping both ends.
pub fn change_points(
    field: Option<&str>,
    messages: &[String],
    log: &TelemetryLog,
) -> (Evidence, ChangeSummary) {
    let mut all = Vec::new();
    let mut last: Option<&Scalar> = None;

    for msg in messages {
        for (row, current) in field_values(log.records(msg), field) {
            if let Some(prev) = last.filter(|p| !p.is_null()) {
                if current != prev {
                    all.push(ChangePoint {
                        message_type: msg.clone(),
                        time: row.time_us(),
                        from: prev.rounded(),
                        to: current.rounded(),
                        full_row: row.rounded(),
                    });
                }
            }
            last = Some(current);
        }
    }

    let total = all.len();
    let sampled = if total <= MAX_CHANGES {
        all
    } else {
        all.sort_by_key(|c| c.time.unwrap_or(0));
        let picks = evenly_spaced(total, MAX_CHANGES);
        all.into_iter()
            .enumerate()
            .filter(|(i, _)| picks.binary_search(i).is_ok())
            .map(|(_, c)| c)
            .collect()
    };

    let summary = ChangeSummary {
        total_changes_detected: total,
        sampled_changes_returned: sampled.len(),
        note: format!(
            "Sampled {} changes evenly across {total} total changes.",
            sampled.len()
        ),
    };
    (Evidence::Changes(sampled), summary)
}

/// `k` strictly increasing indices spanning `0..n`, first and last
/// included. Requires `n > k >= 2`.
fn evenly_spaced(n: usize, k: usize) -> Vec<usize> {
    (0..k).map(|i| i * (n - 1) / (k - 1)).collect()
}
