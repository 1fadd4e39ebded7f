//! Intent classification: question in, validated `Classification` out.
//!
//! Classification never fails. Anything the classifier gets wrong is turned
//! into a fallback classification carrying the reason, which the evidence
//! engine answers with broad sampling.

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use sq_evidence::FieldCatalog;
use sq_protocol::{Classification, Intent, TargetType, Turn};

use crate::oracle::{ChatClient, extract_json};
use crate::prompt::CLASSIFIER_PROMPT;

#[async_trait]
pub trait IntentClassifier: Send + Sync {
    async fn classify(&self, question: &str, catalog: &FieldCatalog) -> Classification;
}

/// Chat-model classifier (Ollama).
pub struct LlmClassifier {
    client: ChatClient,
}

impl LlmClassifier {
    pub fn new(client: ChatClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl IntentClassifier for LlmClassifier {
    async fn classify(&self, question: &str, catalog: &FieldCatalog) -> Classification {
        match self
            .client
            .chat(CLASSIFIER_PROMPT, &[Turn::user(question)])
            .await
        {
            Ok(raw) => interpret(&raw, question, catalog),
            Err(e) => {
                warn!(error = %e, "intent classifier unavailable, falling back");
                Classification::fallback(e.to_string(), Some(question.to_string()))
            }
        }
    }
}

/// Used when classification is switched off in config.
pub struct DisabledClassifier;

#[async_trait]
impl IntentClassifier for DisabledClassifier {
    async fn classify(&self, question: &str, _catalog: &FieldCatalog) -> Classification {
        Classification::fallback("Intent classifier disabled", Some(question.to_string()))
    }
}

/// Validate raw classifier output against the field catalog.
pub fn interpret(raw: &str, question: &str, catalog: &FieldCatalog) -> Classification {
    let classification = validate(raw, catalog)
        .unwrap_or_else(|error| Classification::fallback(error, Some(question.to_string())));
    if let Some(error) = &classification.error {
        warn!(%error, "classification fell back");
    } else {
        debug!(
            intent = %classification.intent,
            target = %classification.target,
            "question classified"
        );
    }
    classification
}

fn validate(raw: &str, catalog: &FieldCatalog) -> Result<Classification, String> {
    let parsed: Value = serde_json::from_str(extract_json(raw)).map_err(|e| e.to_string())?;

    let text = |key: &str| {
        parsed
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
    };
    let (Some(intent), Some(target), Some(target_type)) =
        (text("intent"), text("target"), text("target_type"))
    else {
        return Err("Missing intent, target, or target_type.".into());
    };

    let intent = intent.parse::<Intent>().map_err(|e| e.to_string())?;
    if !Intent::CLASSIFIABLE.contains(&intent) {
        return Err(format!("Unsupported intent: {intent}"));
    }
    let target = target.to_lowercase();

    let mut classification = match target_type.parse::<TargetType>() {
        Ok(TargetType::Message) => {
            if !catalog.contains_message(&target) {
                return Err(format!("Message '{target}' not found"));
            }
            Classification::message(intent, &target)
        }
        Ok(TargetType::Field) => {
            let candidates = catalog.messages_with_field(&target);
            if candidates.is_empty() {
                return Err(format!("Field '{target}' not found"));
            }
            Classification::field(intent, &target, candidates)
        }
        Err(_) => return Err(format!("Invalid target_type: {target_type}")),
    };

    if let Some(at) = parsed.get("query_time_us").and_then(query_time) {
        classification = classification.with_query_time(at);
    }
    Ok(classification)
}

/// Integer microseconds; float values are truncated.
fn query_time(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))
}
