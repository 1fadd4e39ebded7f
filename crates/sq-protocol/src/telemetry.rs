//! Telemetry log data model: scalar values, records, and the per-message-type log.

use serde::{Deserialize, Deserializer, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

/// Field carrying the microsecond timestamp of a record.
pub const TIME_FIELD: &str = "timeus";

/// Round a float to 4 decimal places. Non-finite values become `None`.
pub fn round4(value: f64) -> Option<f64> {
    if value.is_finite() {
        Some((value * 10_000.0).round() / 10_000.0)
    } else {
        None
    }
}

// ── Scalar ────────────────────────────────────────────────────

/// A single field value inside a telemetry record.
///
/// Variant order matters for `#[serde(untagged)]`: integers must be tried
/// before floats so that `1000` stays an `Int`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    /// Scalar view of an arbitrary JSON value. Containers become their
    /// JSON text.
    pub fn from_json(value: &serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => n
                .as_i64()
                .map(Self::Int)
                .or_else(|| n.as_f64().map(Self::Float))
                .unwrap_or_default(),
            Value::String(s) => Self::Text(s.clone()),
            other => Self::Text(other.to_string()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Numeric value for `Int`/`Float` only (no coercion).
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Lenient numeric coercion: numbers, booleans, and numeric strings.
    pub fn coerce_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            Self::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Self::Text(s) => s.trim().parse::<f64>().ok(),
            Self::Null => None,
        }
    }

    /// Integer view used for timestamps. Floats are truncated.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            Self::Float(f) if f.is_finite() => Some(*f as i64),
            _ => None,
        }
    }

    /// Ordering between comparable values. Numbers compare numerically,
    /// text lexicographically; anything else is incomparable.
    pub fn compare(&self, other: &Scalar) -> Option<Ordering> {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => Some(a.cmp(b)),
            (Self::Text(a), Self::Text(b)) => Some(a.cmp(b)),
            (Self::Bool(a), Self::Bool(b)) => Some(a.cmp(b)),
            _ => match (self.as_f64(), other.as_f64()) {
                (Some(a), Some(b)) => a.partial_cmp(&b),
                _ => None,
            },
        }
    }

    /// Copy with floats rounded to 4 places and non-finite floats nulled.
    pub fn rounded(&self) -> Scalar {
        match self {
            Self::Float(f) => round4(*f).map_or(Self::Null, Self::Float),
            other => other.clone(),
        }
    }
}

impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Null, _) | (_, Self::Null) | (Self::Text(_), _) | (_, Self::Text(_)) => false,
            _ => match (self.coerce_f64(), other.coerce_f64()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
        }
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<bool> for Scalar {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

// ── Record ────────────────────────────────────────────────────

/// One telemetry message instance: lower-case field name → scalar value.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Record(BTreeMap<String, Scalar>);

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record, lower-casing every field name.
    pub fn from_fields<K: AsRef<str>>(fields: impl IntoIterator<Item = (K, Scalar)>) -> Self {
        Self(
            fields
                .into_iter()
                .map(|(k, v)| (k.as_ref().to_lowercase(), v))
                .collect(),
        )
    }

    pub fn insert(&mut self, field: impl AsRef<str>, value: impl Into<Scalar>) {
        self.0.insert(field.as_ref().to_lowercase(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&Scalar> {
        self.0.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Case-insensitive lookup returning the stored key and its value.
    pub fn get_ignore_case(&self, field: &str) -> Option<(&str, &Scalar)> {
        self.0
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(field))
            .map(|(k, v)| (k.as_str(), v))
    }

    /// Microsecond timestamp, if the record carries a numeric `timeus`.
    pub fn time_us(&self) -> Option<i64> {
        self.0.get(TIME_FIELD).and_then(Scalar::as_i64)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Scalar)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Copy with every float rounded to 4 places (non-finite → null).
    pub fn rounded(&self) -> Record {
        Self(
            self.0
                .iter()
                .map(|(k, v)| (k.clone(), v.rounded()))
                .collect(),
        )
    }
}

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        BTreeMap::<String, Scalar>::deserialize(deserializer).map(Record::from_fields)
    }
}

impl<K: AsRef<str>> FromIterator<(K, Scalar)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, Scalar)>>(iter: I) -> Self {
        Self::from_fields(iter)
    }
}

// ── Telemetry Log ─────────────────────────────────────────────

/// The canonical, read-only telemetry dataset: message type → records.
///
/// Record order is insertion order and is not guaranteed to be
/// chronological; callers needing chronology sort by `timeus`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TelemetryLog {
    messages: BTreeMap<String, Vec<Record>>,
}

impl TelemetryLog {
    /// Build a log, lower-casing message type names.
    pub fn new<K: AsRef<str>>(messages: impl IntoIterator<Item = (K, Vec<Record>)>) -> Self {
        let mut merged: BTreeMap<String, Vec<Record>> = BTreeMap::new();
        for (name, records) in messages {
            merged
                .entry(name.as_ref().to_lowercase())
                .or_default()
                .extend(records);
        }
        Self { messages: merged }
    }

    pub fn from_json_str(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Records of a message type; empty when the type is absent.
    pub fn records(&self, message_type: &str) -> &[Record] {
        self.messages
            .get(message_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn contains(&self, message_type: &str) -> bool {
        self.messages.contains_key(message_type)
    }

    pub fn message_types(&self) -> impl Iterator<Item = &str> {
        self.messages.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Record])> {
        self.messages
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Union of every field name appearing anywhere in the log.
    pub fn field_names(&self) -> BTreeSet<String> {
        self.messages
            .values()
            .flatten()
            .flat_map(|r| r.fields().map(str::to_string))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl<'de> Deserialize<'de> for TelemetryLog {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        BTreeMap::<String, Vec<Record>>::deserialize(deserializer).map(TelemetryLog::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_untagged_keeps_integers() {
        let v: Vec<Scalar> = serde_json::from_str(r#"[1000, 2.5, "ok", null, true]"#).unwrap();
        assert!(matches!(v[0], Scalar::Int(1000)));
        assert!(matches!(v[1], Scalar::Float(_)));
        assert!(matches!(v[2], Scalar::Text(_)));
        assert!(v[3].is_null());
        assert!(matches!(v[4], Scalar::Bool(true)));
    }

    #[test]
    fn numeric_equality_crosses_int_and_float() {
        assert_eq!(Scalar::Int(1), Scalar::Float(1.0));
        assert_ne!(Scalar::Int(1), Scalar::Text("1".into()));
        assert_ne!(Scalar::Null, Scalar::Int(0));
    }

    #[test]
    fn compare_rejects_mixed_kinds() {
        assert_eq!(
            Scalar::Int(3).compare(&Scalar::Float(2.5)),
            Some(Ordering::Greater)
        );
        assert!(Scalar::Int(3).compare(&Scalar::Text("a".into())).is_none());
        assert!(Scalar::Null.compare(&Scalar::Null).is_none());
    }

    #[test]
    fn coerce_parses_numeric_text() {
        assert_eq!(Scalar::Text(" 12.5 ".into()).coerce_f64(), Some(12.5));
        assert_eq!(Scalar::Text("abc".into()).coerce_f64(), None);
        assert_eq!(Scalar::Null.coerce_f64(), None);
    }

    #[test]
    fn round4_normalizes_non_finite() {
        assert_eq!(round4(1.234_567), Some(1.2346));
        assert_eq!(round4(f64::NAN), None);
        assert_eq!(round4(f64::INFINITY), None);
        assert!(Scalar::Float(f64::NAN).rounded().is_null());
    }

    #[test]
    fn log_lowercases_keys() {
        let log = TelemetryLog::from_json_str(
            r#"{"GPS": [{"TimeUS": 1000, "Alt": 5}], "gps": [{"timeus": 2000}]}"#,
        )
        .unwrap();
        assert_eq!(log.len(), 1);
        let rows = log.records("gps");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].time_us(), Some(1000));
        assert!(rows[0].contains("alt"));
        assert!(log.records("bat").is_empty());
    }

    #[test]
    fn field_names_is_union() {
        let log = TelemetryLog::from_json_str(
            r#"{"gps": [{"timeus": 1, "alt": 5}], "bat": [{"timeus": 1, "volt": 12.1}]}"#,
        )
        .unwrap();
        let fields: Vec<String> = log.field_names().into_iter().collect();
        assert_eq!(fields, vec!["alt", "timeus", "volt"]);
    }

    #[test]
    fn get_ignore_case_finds_stored_key() {
        let row = Record::from_fields([("alt", Scalar::Int(5))]);
        let (key, value) = row.get_ignore_case("ALT").unwrap();
        assert_eq!(key, "alt");
        assert_eq!(*value, Scalar::Int(5));
    }
}
