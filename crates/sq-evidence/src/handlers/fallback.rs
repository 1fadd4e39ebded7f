//! fallback: broad, reproducible sampling when no targeted query applies.

use rand::SeedableRng;
use rand::rngs::StdRng;

use sq_protocol::{Evidence, Record, SampledRow, TelemetryLog};

/// Message types sampled, most informative first.
pub const PRIORITY_MESSAGES: [&str; 9] = [
    "err", "arm", "ctun", "vfr_hud", "bat", "gps", "ahr2", "att", "pos",
];
pub const ROWS_PER_MESSAGE: usize = 10;
pub const SEED: u64 = 42;

/// Up to `ROWS_PER_MESSAGE` rows from each priority message type present.
///
/// Short series are returned whole, medium ones sampled at random (fixed
/// seed, original order kept), and long ones split into head, middle and
/// tail so the whole flight is covered.
pub fn sample(log: &TelemetryLog) -> Evidence {
    let mut rng = StdRng::seed_from_u64(SEED);
    let mut found = Vec::new();

    for msg in PRIORITY_MESSAGES {
        let rows = log.records(msg);
        if rows.is_empty() {
            continue;
        }

        let picked: Vec<&Record> = if rows.len() <= ROWS_PER_MESSAGE {
            rows.iter().collect()
        } else if rows.len() < 3 * ROWS_PER_MESSAGE {
            let mut idx = rand::seq::index::sample(&mut rng, rows.len(), ROWS_PER_MESSAGE).into_vec();
            idx.sort_unstable();
            idx.into_iter().map(|i| &rows[i]).collect()
        } else {
            let part = ROWS_PER_MESSAGE / 3;
            let tail = ROWS_PER_MESSAGE - 2 * part;
            let third = rows.len() / 3;
            rows[..part]
                .iter()
                .chain(&rows[third..third + part])
                .chain(&rows[rows.len() - tail..])
                .collect()
        };

        found.extend(picked.into_iter().map(|row| SampledRow {
            message_type: msg.to_string(),
            row: row.rounded(),
        }));
    }

    Evidence::Samples(found)
}
