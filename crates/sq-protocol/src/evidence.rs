//! Evidence bundles: the deterministic extract handed to the answer oracle.
//!
//! Each intent produces its own evidence shape. Bundles serialize to the
//! flat JSON object the oracle sees and deserialize back (intent-directed)
//! when a clarification context is resumed.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::classification::Intent;
use crate::telemetry::{Record, Scalar};

// ── Evidence entries ──────────────────────────────────────────

/// A single observed value: an extreme (max/min) or an anomaly candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub message_type: String,
    pub value: Scalar,
    pub time: Option<i64>,
    pub full_row: Record,
}

/// A point where a field's value differs from the previous record's.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub message_type: String,
    pub field: String,
    pub old_value: Scalar,
    pub new_value: Scalar,
    pub time: Option<i64>,
    pub full_row: Record,
}

/// Time span covered by a message type's timestamped records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DurationSpan {
    pub message_type: String,
    pub start_time: i64,
    pub end_time: i64,
    pub duration_us: i64,
    pub duration_s: f64,
}

/// A record near a queried timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedValue {
    pub message_type: String,
    pub value: Scalar,
    pub timestamp: i64,
    pub difference_us: i64,
    pub full_row: Record,
}

/// Numeric aggregate of a field in a summary. Non-finite results are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericStats {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSummary {
    pub sample_values: Vec<Scalar>,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub stats: Option<NumericStats>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageSummary {
    pub entry_count: usize,
    #[serde(default)]
    pub field_summary: BTreeMap<String, FieldSummary>,
    #[serde(default)]
    pub sample_rows: Vec<Record>,
}

/// A change point on the merged (cross-message-type) timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangePoint {
    pub message_type: String,
    pub time: Option<i64>,
    pub from: Scalar,
    pub to: Scalar,
    pub full_row: Record,
}

/// A record drawn by the fallback sampler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampledRow {
    pub message_type: String,
    pub row: Record,
}

/// Why a message type contributed (or did not contribute) to a
/// value-at-time query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Availability {
    /// The message type has no records at all.
    NoData { message_type: String },
    MatchedRows { message_type: String, count: usize },
    FieldPresentButOutOfWindow {
        message_type: String,
        closest_timeus: Option<i64>,
        time_diff_us: Option<i64>,
    },
    FieldNotPresent {
        message_type: String,
        available_fields_sample: Vec<String>,
    },
}

/// Totals reported by change detection when it down-samples.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSummary {
    pub total_changes_detected: usize,
    pub sampled_changes_returned: usize,
    pub note: String,
}

// ── Evidence ──────────────────────────────────────────────────

/// Intent-specific evidence payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Evidence {
    Extremes(Vec<Observation>),
    Transitions(Vec<Transition>),
    Durations(Vec<DurationSpan>),
    ValuesAtTime(Vec<TimedValue>),
    Summary(BTreeMap<String, MessageSummary>),
    Changes(Vec<ChangePoint>),
    Anomalies(Vec<Observation>),
    Samples(Vec<SampledRow>),
    /// Message-typed targets: one evidence payload per field.
    ByField(BTreeMap<String, Evidence>),
}

impl Evidence {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Extremes(v) | Self::Anomalies(v) => v.is_empty(),
            Self::Transitions(v) => v.is_empty(),
            Self::Durations(v) => v.is_empty(),
            Self::ValuesAtTime(v) => v.is_empty(),
            Self::Summary(m) => m.is_empty(),
            Self::Changes(v) => v.is_empty(),
            Self::Samples(v) => v.is_empty(),
            Self::ByField(m) => m.is_empty(),
        }
    }

    /// Number of top-level entries (rows, message types, or fields).
    pub fn len(&self) -> usize {
        match self {
            Self::Extremes(v) | Self::Anomalies(v) => v.len(),
            Self::Transitions(v) => v.len(),
            Self::Durations(v) => v.len(),
            Self::ValuesAtTime(v) => v.len(),
            Self::Summary(m) => m.len(),
            Self::Changes(v) => v.len(),
            Self::Samples(v) => v.len(),
            Self::ByField(m) => m.len(),
        }
    }

    /// Decode a serialized payload for `intent`. `by_field` selects the
    /// per-field map produced for message-typed targets.
    pub fn decode(
        intent: Intent,
        by_field: bool,
        value: serde_json::Value,
    ) -> serde_json::Result<Self> {
        if by_field {
            let fields: BTreeMap<String, serde_json::Value> = serde_json::from_value(value)?;
            return fields
                .into_iter()
                .map(|(field, v)| Ok((field, Self::decode(intent, false, v)?)))
                .collect::<serde_json::Result<BTreeMap<_, _>>>()
                .map(Self::ByField);
        }
        Ok(match intent {
            Intent::MaxValue | Intent::MinValue => Self::Extremes(decode_as(value)?),
            Intent::EventDetection => Self::Transitions(decode_as(value)?),
            Intent::TimeDuration => Self::Durations(decode_as(value)?),
            Intent::ValueAtTime => Self::ValuesAtTime(decode_as(value)?),
            Intent::Summary => Self::Summary(decode_as(value)?),
            Intent::ChangeDetection => Self::Changes(decode_as(value)?),
            Intent::AnomalyDetection => Self::Anomalies(decode_as(value)?),
            Intent::Fallback => Self::Samples(decode_as(value)?),
        })
    }
}

fn decode_as<T: DeserializeOwned>(value: serde_json::Value) -> serde_json::Result<T> {
    serde_json::from_value(value)
}

// ── Evidence Bundle ───────────────────────────────────────────

/// Output of the evidence dispatch engine.
///
/// Never represents a failure by absence: degraded results carry `error`
/// and no evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBundle")]
pub struct EvidenceBundle {
    pub intent: Intent,
    pub field: Option<String>,
    pub candidate_messages: Vec<String>,
    /// `None` when no evidence was found (never an empty payload).
    pub evidence: Option<Evidence>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_time_us: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unavailable_sources: Option<Vec<Availability>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<ChangeSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EvidenceBundle {
    /// Build a bundle; empty evidence is normalized to `None`.
    pub fn new(
        intent: Intent,
        field: Option<String>,
        candidate_messages: Vec<String>,
        evidence: Option<Evidence>,
    ) -> Self {
        Self {
            intent,
            field,
            candidate_messages,
            evidence: evidence.filter(|e| !e.is_empty()),
            query_time_us: None,
            unavailable_sources: None,
            summary: None,
            note: None,
            warning: None,
            error: None,
        }
    }

    /// A degraded bundle: `error` set, no evidence.
    pub fn failed(
        intent: Intent,
        field: Option<String>,
        candidate_messages: Vec<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::new(intent, field, candidate_messages, None)
        }
    }

    pub fn has_evidence(&self) -> bool {
        self.evidence.is_some()
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

#[derive(Deserialize)]
struct RawBundle {
    intent: Intent,
    #[serde(default)]
    field: Option<String>,
    #[serde(default)]
    candidate_messages: Vec<String>,
    #[serde(default)]
    evidence: Option<serde_json::Value>,
    #[serde(default)]
    query_time_us: Option<i64>,
    #[serde(default)]
    unavailable_sources: Option<Vec<Availability>>,
    #[serde(default)]
    summary: Option<ChangeSummary>,
    #[serde(default)]
    note: Option<String>,
    #[serde(default)]
    warning: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl TryFrom<RawBundle> for EvidenceBundle {
    type Error = serde_json::Error;

    fn try_from(raw: RawBundle) -> Result<Self, Self::Error> {
        let by_field = raw.field.is_none() && raw.intent != Intent::Fallback;
        let evidence = match raw.evidence {
            None | Some(serde_json::Value::Null) => None,
            Some(value) => {
                let by_field = by_field && value.is_object();
                Some(Evidence::decode(raw.intent, by_field, value)?)
            }
        };
        Ok(Self {
            intent: raw.intent,
            field: raw.field,
            candidate_messages: raw.candidate_messages,
            evidence,
            query_time_us: raw.query_time_us,
            unavailable_sources: raw.unavailable_sources,
            summary: raw.summary,
            note: raw.note,
            warning: raw.warning,
            error: raw.error,
        })
    }
}

// ── Extra context ─────────────────────────────────────────────

/// Side-channel facts copied out of a bundle for the answer oracle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtraContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_time_us: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unavailable_sources: Option<Vec<Availability>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<ChangeSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExtraContext {
    pub fn from_bundle(bundle: &EvidenceBundle) -> Self {
        Self {
            query_time_us: bundle.query_time_us,
            unavailable_sources: bundle.unavailable_sources.clone(),
            summary: bundle.summary.clone(),
            note: bundle.note.clone(),
            warning: bundle.warning.clone(),
            error: bundle.error.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
