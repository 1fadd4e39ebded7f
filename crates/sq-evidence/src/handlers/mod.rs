//! One deterministic extraction algorithm per intent.
//!
//! Every handler scans the records of each requested message type in log
//! order. A record qualifies when it carries the target field. Floats are
//! rounded on the way out; comparisons always use the raw values.

pub mod anomalies;
pub mod changes;
pub mod duration;
pub mod events;
pub mod extremes;
pub mod fallback;
pub mod summary;
pub mod value_at_time;

use sq_protocol::{Record, Scalar};

/// Records carrying `field`, paired with the field's value.
/// A `None` field matches nothing.
pub(crate) fn field_values<'a>(
    records: &'a [Record],
    field: Option<&'a str>,
) -> impl Iterator<Item = (&'a Record, &'a Scalar)> + 'a {
    records
        .iter()
        .filter_map(move |row| field.and_then(|f| row.get(f)).map(|v| (row, v)))
}
