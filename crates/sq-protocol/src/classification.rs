use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::ParseEnumError;

/// High-level kind of question being asked about the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    MaxValue,
    MinValue,
    EventDetection,
    TimeDuration,
    ValueAtTime,
    Summary,
    ChangeDetection,
    AnomalyDetection,
    /// Classification absent or invalid; broad sampling instead of a query.
    Fallback,
}

impl Intent {
    /// Intents a classifier may emit (everything except `Fallback`).
    pub const CLASSIFIABLE: [Intent; 8] = [
        Self::MaxValue,
        Self::MinValue,
        Self::EventDetection,
        Self::TimeDuration,
        Self::ValueAtTime,
        Self::Summary,
        Self::ChangeDetection,
        Self::AnomalyDetection,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MaxValue => "max_value",
            Self::MinValue => "min_value",
            Self::EventDetection => "event_detection",
            Self::TimeDuration => "time_duration",
            Self::ValueAtTime => "value_at_time",
            Self::Summary => "summary",
            Self::ChangeDetection => "change_detection",
            Self::AnomalyDetection => "anomaly_detection",
            Self::Fallback => "fallback",
        }
    }

    /// Whether a message-typed target is expanded into one query per field.
    pub fn is_field_oriented(&self) -> bool {
        !matches!(self, Self::Fallback)
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Intent {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::CLASSIFIABLE
            .into_iter()
            .chain([Self::Fallback])
            .find(|i| i.as_str() == s)
            .ok_or_else(|| ParseEnumError::new("intent", s))
    }
}

/// Whether the classified target names a message type or a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetType {
    Message,
    Field,
}

impl FromStr for TargetType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "message" => Ok(Self::Message),
            "field" => Ok(Self::Field),
            other => Err(ParseEnumError::new("target_type", other)),
        }
    }
}

/// Intent-specific parameters extracted alongside the classification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_time_us: Option<i64>,
}

/// Structured reading of a natural-language question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub intent: Intent,
    /// Message type or field name. Always compared lower-cased.
    #[serde(default)]
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_type: Option<TargetType>,
    /// Message types known to carry a field target.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidate_messages: Option<Vec<String>>,
    #[serde(default)]
    pub extra_params: ExtraParams,
    /// Why the classifier fell back, when it did.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_query: Option<String>,
}

impl Classification {
    pub fn new(intent: Intent, target: impl AsRef<str>, target_type: TargetType) -> Self {
        Self {
            intent,
            target: target.as_ref().to_lowercase(),
            target_type: Some(target_type),
            candidate_messages: None,
            extra_params: ExtraParams::default(),
            error: None,
            original_query: None,
        }
    }

    /// A field-targeted classification over the given message types.
    pub fn field<S: AsRef<str>>(
        intent: Intent,
        target: impl AsRef<str>,
        candidates: impl IntoIterator<Item = S>,
    ) -> Self {
        Self::new(intent, target, TargetType::Field).with_candidates(candidates)
    }

    pub fn message(intent: Intent, target: impl AsRef<str>) -> Self {
        Self::new(intent, target, TargetType::Message)
    }

    /// Classification used when the classifier failed or was unusable.
    pub fn fallback(error: impl Into<String>, original_query: Option<String>) -> Self {
        Self {
            intent: Intent::Fallback,
            target: String::new(),
            target_type: None,
            candidate_messages: None,
            extra_params: ExtraParams::default(),
            error: Some(error.into()),
            original_query,
        }
    }

    pub fn with_candidates<S: AsRef<str>>(mut self, candidates: impl IntoIterator<Item = S>) -> Self {
        self.candidate_messages = Some(
            candidates
                .into_iter()
                .map(|c| c.as_ref().to_lowercase())
                .collect(),
        );
        self
    }

    pub fn with_query_time(mut self, query_time_us: i64) -> Self {
        self.extra_params.query_time_us = Some(query_time_us);
        self
    }

    /// Target lower-cased, regardless of how it was constructed.
    pub fn normalized_target(&self) -> String {
        self.target.to_lowercase()
    }
}
