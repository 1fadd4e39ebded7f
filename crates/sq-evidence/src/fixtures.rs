//! Sample flight data for tests across the workspace.

use std::collections::BTreeMap;

use sq_protocol::{Record, Scalar, TelemetryLog};

use crate::catalog::{FieldCatalog, MessageDefinition};

fn row<const N: usize>(fields: [(&str, Scalar); N]) -> Record {
    Record::from_fields(fields)
}

/// A short flight with gps, bat, err, att and mode records.
///
/// gps.alt peaks at 12 (twice, first at t=3s); gps.status drops to 1 once;
/// bat is sampled at its own rate; mode carries text only.
pub fn sample_flight_log() -> TelemetryLog {
    let alts = [5, 9, 12, 12, 7, 3];
    let speeds = [0.0, 2.5, 4.25, 4.25, 3.0, 0.0];
    let statuses = [3, 3, 3, 1, 3, 3];
    let gps: Vec<Record> = (0..6)
        .map(|i| {
            row([
                ("timeus", Scalar::Int(1_000_000 * (i as i64 + 1))),
                ("alt", Scalar::Int(alts[i])),
                ("spd", Scalar::Float(speeds[i])),
                ("status", Scalar::Int(statuses[i])),
            ])
        })
        .collect();

    let bat: Vec<Record> = [
        (1_500_000, 12.6, 1.2),
        (3_000_000, 12.3, 8.4),
        (4_500_000, 12.0, 9.1),
        (6_000_000, 11.8, 0.5),
    ]
    .into_iter()
    .map(|(t, volt, curr)| {
        row([
            ("timeus", Scalar::Int(t)),
            ("volt", Scalar::Float(volt)),
            ("curr", Scalar::Float(curr)),
        ])
    })
    .collect();

    let err = vec![
        row([("timeus", Scalar::Int(2_200_000)), ("subsys", Scalar::Int(11)), ("ecode", Scalar::Int(2))]),
        row([("timeus", Scalar::Int(5_100_000)), ("subsys", Scalar::Int(11)), ("ecode", Scalar::Int(0))]),
    ];

    let att: Vec<Record> = [(1_000_000, 0.5), (2_000_000, -1.5), (3_000_000, 22.75), (4_000_000, 0.25)]
        .into_iter()
        .map(|(t, roll)| row([("timeus", Scalar::Int(t)), ("roll", Scalar::Float(roll))]))
        .collect();

    let mode = vec![row([("timeus", Scalar::Int(900_000)), ("name", "stabilize".into())])];

    TelemetryLog::new([
        ("gps", gps),
        ("bat", bat),
        ("err", err),
        ("att", att),
        ("mode", mode),
    ])
}

/// Definitions matching `sample_flight_log`, plus a declared but unlogged
/// `gps.lat` and an unlogged `pos` message type.
pub fn sample_catalog() -> FieldCatalog {
    let defs: BTreeMap<String, MessageDefinition> = [
        ("GPS", &["TimeUS", "Alt", "Spd", "Status", "Lat"][..]),
        ("BAT", &["TimeUS", "Volt", "Curr"][..]),
        ("ERR", &["TimeUS", "Subsys", "ECode"][..]),
        ("ATT", &["TimeUS", "mavpackettype", "Roll"][..]),
        ("MODE", &["TimeUS", "Name"][..]),
        ("POS", &["TimeUS", "Lat", "Lng", "Alt"][..]),
    ]
    .into_iter()
    .map(|(msg, fields)| {
        let def = MessageDefinition {
            fields: fields.iter().map(|f| f.to_string()).collect(),
        };
        (msg.to_string(), def)
    })
    .collect();
    FieldCatalog::from_definitions(defs)
}
