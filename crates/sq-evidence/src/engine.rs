//! Evidence dispatch: classification + log → evidence bundle.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use sq_protocol::{Classification, Evidence, EvidenceBundle, Intent, TargetType, TelemetryLog};

use crate::catalog::FieldCatalog;
use crate::handlers::{
    anomalies, changes, duration, events, extremes, extremes::Extreme, fallback, summary,
    value_at_time,
};

/// Maps a classified question onto one deterministic extraction algorithm.
///
/// Pure and total: never mutates the log, never fails. Problems are
/// reported through `EvidenceBundle::error` with no evidence attached.
#[derive(Debug, Clone, Default)]
pub struct EvidenceEngine {
    catalog: FieldCatalog,
}

impl EvidenceEngine {
    pub fn new(catalog: FieldCatalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &FieldCatalog {
        &self.catalog
    }

    pub fn dispatch(&self, classification: &Classification, log: &TelemetryLog) -> EvidenceBundle {
        let intent = classification.intent;
        let target = classification.normalized_target();

        if intent == Intent::Fallback {
            let mut bundle = fallback_bundle(log);
            bundle.warning = classification.error.clone();
            return bundle;
        }

        let supplied = match (&classification.candidate_messages, classification.target_type) {
            (Some(candidates), _) => candidates.iter().map(|c| c.to_lowercase()).collect(),
            (None, Some(TargetType::Message)) => vec![target.clone()],
            (None, _) => Vec::new(),
        };
        let candidates: Vec<String> = supplied
            .iter()
            .filter(|m| log.contains(m))
            .cloned()
            .collect();

        if candidates.is_empty() {
            warn!(%intent, target = %target, ?supplied, "no candidate message types in log, sampling instead");
            let mut bundle = fallback_bundle(log);
            bundle.note = Some(format!(
                "None of the candidate message types {supplied:?} are present in the log; showing a broad sample instead."
            ));
            return bundle;
        }

        let query_time_us = classification.extra_params.query_time_us;

        match classification.target_type {
            Some(TargetType::Field) => {
                debug!(%intent, field = %target, ?candidates, "dispatching field query");
                run_intent(intent, Some(&target), candidates, log, query_time_us)
            }
            Some(TargetType::Message) => {
                if !self.catalog.contains_message(&target) {
                    warn!(message_type = %target, "unknown message type");
                    return EvidenceBundle::failed(
                        intent,
                        Some(target.clone()),
                        Vec::new(),
                        format!("Unknown message type '{target}'."),
                    );
                }
                let scope = vec![target.clone()];
                if intent.is_field_oriented() {
                    self.per_field(intent, &target, scope, log, query_time_us)
                } else {
                    run_intent(intent, None, scope, log, query_time_us)
                }
            }
            None => EvidenceBundle::failed(
                intent,
                Some(target),
                candidates,
                "Invalid or missing target_type",
            ),
        }
    }

    /// Run a field-oriented intent once per queryable field of a message
    /// type; fields yielding nothing are left out of the map.
    fn per_field(
        &self,
        intent: Intent,
        message_type: &str,
        scope: Vec<String>,
        log: &TelemetryLog,
        query_time_us: Option<i64>,
    ) -> EvidenceBundle {
        if intent == Intent::ValueAtTime && query_time_us.is_none() {
            return missing_query_time(None, scope);
        }

        let mut by_field = BTreeMap::new();
        for field in self.catalog.queryable_fields(message_type) {
            let bundle = run_intent(intent, Some(field), scope.clone(), log, query_time_us);
            if let Some(evidence) = bundle.evidence {
                by_field.insert(field.to_string(), evidence);
            }
        }
        debug!(%intent, message_type, fields = by_field.len(), "per-field dispatch done");

        let mut bundle = EvidenceBundle::new(intent, None, scope, Some(Evidence::ByField(by_field)));
        bundle.query_time_us = query_time_us;
        bundle
    }
}

/// Exhaustive intent → handler mapping for a single field.
fn run_intent(
    intent: Intent,
    field: Option<&str>,
    messages: Vec<String>,
    log: &TelemetryLog,
    query_time_us: Option<i64>,
) -> EvidenceBundle {
    let owned_field = field.map(str::to_string);
    match intent {
        Intent::MaxValue | Intent::MinValue => {
            let which = if intent == Intent::MaxValue {
                Extreme::Max
            } else {
                Extreme::Min
            };
            let evidence = extremes::extremes(which, field, &messages, log);
            EvidenceBundle::new(intent, owned_field, messages, Some(evidence))
        }
        Intent::EventDetection => {
            let evidence = events::transitions(field, &messages, log);
            EvidenceBundle::new(intent, owned_field, messages, Some(evidence))
        }
        Intent::TimeDuration => {
            let evidence = duration::durations(field, &messages, log);
            EvidenceBundle::new(intent, owned_field, messages, Some(evidence))
        }
        Intent::ValueAtTime => {
            let Some(at) = query_time_us else {
                return missing_query_time(owned_field, messages);
            };
            let (evidence, report) = value_at_time::values_at_time(field, &messages, log, at);
            let mut bundle = EvidenceBundle::new(intent, owned_field, messages, Some(evidence));
            bundle.query_time_us = Some(at);
            bundle.unavailable_sources = Some(report);
            bundle
        }
        Intent::Summary => {
            let evidence = summary::summarize(&messages, log);
            EvidenceBundle::new(intent, owned_field, messages, Some(evidence))
        }
        Intent::ChangeDetection => {
            let (evidence, totals) = changes::change_points(field, &messages, log);
            let mut bundle = EvidenceBundle::new(intent, owned_field, messages, Some(evidence));
            bundle.summary = Some(totals);
            bundle
        }
        Intent::AnomalyDetection => {
            let evidence = anomalies::anomalies(field, &messages, log);
            EvidenceBundle::new(intent, owned_field, messages, Some(evidence))
        }
        Intent::Fallback => fallback_bundle(log),
    }
}

fn fallback_bundle(log: &TelemetryLog) -> EvidenceBundle {
    let scope = fallback::PRIORITY_MESSAGES
        .iter()
        .map(|m| m.to_string())
        .collect();
    EvidenceBundle::new(Intent::Fallback, None, scope, Some(fallback::sample(log)))
}

fn missing_query_time(field: Option<String>, messages: Vec<String>) -> EvidenceBundle {
    EvidenceBundle::failed(
        Intent::ValueAtTime,
        field,
        messages,
        "Missing query_time_us for value_at_time intent",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use serde_json::json;
    use sq_protocol::{Availability, Record, Scalar};

    fn engine() -> EvidenceEngine {
        EvidenceEngine::new(fixtures::sample_catalog())
    }

    fn scenario_log() -> TelemetryLog {
        TelemetryLog::from_json_str(
            r#"{"gps": [{"timeus":1000,"alt":5},{"timeus":2000,"alt":9},{"timeus":3000,"alt":3}]}"#,
        )
        .unwrap()
    }

    #[test]
    fn max_value_scenario() {
        let c = Classification::field(Intent::MaxValue, "alt", ["gps"]);
        let bundle = EvidenceEngine::default().dispatch(&c, &scenario_log());
        let json = serde_json::to_value(&bundle).unwrap();
        assert_eq!(
            json["evidence"],
            json!([{
                "message_type": "gps",
                "value": 9,
                "time": 2000,
                "full_row": {"timeus": 2000, "alt": 9}
            }])
        );
        assert_eq!(json["field"], "alt");
        assert!(json.get("error").is_none());
    }

    #[test]
    fn time_duration_scenario() {
        let c = Classification::field(Intent::TimeDuration, "timeus", ["gps"]);
        let bundle = EvidenceEngine::default().dispatch(&c, &scenario_log());
        let json = serde_json::to_value(&bundle).unwrap();
        assert_eq!(json["evidence"][0]["duration_us"], 2000);
        assert_eq!(json["evidence"][0]["duration_s"], 0.002);
    }

    #[test]
    fn absent_candidates_are_dropped() {
        let log = fixtures::sample_flight_log();
        let c = Classification::field(Intent::MaxValue, "alt", ["ahr2", "gps"]);
        let bundle = engine().dispatch(&c, &log);
        assert_eq!(bundle.candidate_messages, vec!["gps"]);
        assert_eq!(bundle.intent, Intent::MaxValue);
    }

    #[test]
    fn empty_intersection_falls_back_to_sampler() {
        let log = fixtures::sample_flight_log();
        let c = Classification::field(Intent::MaxValue, "alt", ["ahr2", "pos"]);
        let bundle = engine().dispatch(&c, &log);
        assert_eq!(bundle.intent, Intent::Fallback);
        assert!(bundle.has_evidence());
        assert!(bundle.note.is_some());
        assert!(bundle.error.is_none());
    }

    #[test]
    fn fallback_classification_carries_warning() {
        let log = fixtures::sample_flight_log();
        let c = Classification::fallback("Field 'foo' not found", None);
        let bundle = engine().dispatch(&c, &log);
        assert_eq!(bundle.intent, Intent::Fallback);
        assert_eq!(bundle.warning.as_deref(), Some("Field 'foo' not found"));
        assert_eq!(bundle.candidate_messages.len(), fallback::PRIORITY_MESSAGES.len());
    }

    #[test]
    fn message_target_expands_per_field() {
        let log = fixtures::sample_flight_log();
        let c = Classification::message(Intent::MaxValue, "gps");
        let bundle = engine().dispatch(&c, &log);
        assert!(bundle.field.is_none());
        assert_eq!(bundle.candidate_messages, vec!["gps"]);
        let Some(Evidence::ByField(fields)) = &bundle.evidence else {
            panic!("expected per-field evidence, got {:?}", bundle.evidence);
        };
        assert!(fields.contains_key("alt"));
        assert!(fields.contains_key("spd"));
        // Declared but never logged.
        assert!(!fields.contains_key("lat"));
        assert!(!fields.contains_key("timeus"));
    }

    #[test]
    fn unknown_message_type_is_an_error_bundle() {
        let base = fixtures::sample_flight_log();
        let log = TelemetryLog::new(
            base.iter()
                .map(|(m, r)| (m.to_string(), r.to_vec()))
                .chain([("xkf1".to_string(), vec![Record::from_fields([("timeus", Scalar::Int(1))])])]),
        );
        let c = Classification::message(Intent::Summary, "xkf1");
        let bundle = engine().dispatch(&c, &log);
        assert_eq!(bundle.error.as_deref(), Some("Unknown message type 'xkf1'."));
        assert!(!bundle.has_evidence());
    }

    #[test]
    fn missing_target_type_is_an_error_bundle() {
        let log = fixtures::sample_flight_log();
        let mut c = Classification::field(Intent::MinValue, "alt", ["gps"]);
        c.target_type = None;
        let bundle = engine().dispatch(&c, &log);
        assert_eq!(bundle.error.as_deref(), Some("Invalid or missing target_type"));
        assert!(bundle.evidence.is_none());
    }

    #[test]
    fn value_at_time_requires_query_time() {
        let log = fixtures::sample_flight_log();
        let by_field = engine().dispatch(&Classification::message(Intent::ValueAtTime, "bat"), &log);
        assert!(by_field.is_error());

        let single = engine().dispatch(&Classification::field(Intent::ValueAtTime, "volt", ["bat"]), &log);
        assert_eq!(
            single.error.as_deref(),
            Some("Missing query_time_us for value_at_time intent")
        );
    }

    #[test]
    fn value_at_time_reports_sources() {
        let log = fixtures::sample_flight_log();
        let c = Classification::field(Intent::ValueAtTime, "volt", ["bat"]).with_query_time(3_100_000);
        let bundle = engine().dispatch(&c, &log);
        assert_eq!(bundle.query_time_us, Some(3_100_000));
        let sources = bundle.unavailable_sources.unwrap();
        assert!(matches!(sources[0], Availability::MatchedRows { count: 1, .. }));
    }

    #[test]
    fn change_detection_always_reports_summary() {
        let log = fixtures::sample_flight_log();
        let c = Classification::field(Intent::ChangeDetection, "status", ["gps"]);
        let bundle = engine().dispatch(&c, &log);
        let summary = bundle.summary.unwrap();
        assert_eq!(summary.total_changes_detected, 2);
        assert_eq!(summary.sampled_changes_returned, 2);
    }

    #[test]
    fn floats_are_rounded_on_the_way_out() {
        let log = TelemetryLog::new([(
            "bat",
            vec![
                Record::from_fields([("timeus", Scalar::Int(1)), ("volt", Scalar::Float(12.345_678))]),
                Record::from_fields([("timeus", Scalar::Int(2)), ("volt", Scalar::Float(f64::NAN))]),
            ],
        )]);
        let c = Classification::field(Intent::EventDetection, "volt", ["bat"]);
        let json = serde_json::to_value(engine().dispatch(&c, &log)).unwrap();
        assert_eq!(json["evidence"][0]["old_value"], 12.3457);
        assert!(json["evidence"][0]["new_value"].is_null());
        assert!(json["evidence"][0]["full_row"]["volt"].is_null());
    }

    #[test]
    fn bundle_survives_serialization() {
        let log = fixtures::sample_flight_log();
        let c = Classification::message(Intent::AnomalyDetection, "bat");
        let bundle = engine().dispatch(&c, &log);
        let text = serde_json::to_string(&bundle).unwrap();
        let back: EvidenceBundle = serde_json::from_str(&text).unwrap();
        assert_eq!(back, bundle);
    }
}
