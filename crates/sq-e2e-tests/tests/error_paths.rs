//! E2E tests for degraded and failing paths.

mod helpers;

use serde_json::{Value, json};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, ResponseTemplate};

use helpers::{ORACLE_MODEL, TestHarness, ollama_reply};
use sq_agent::{AgentError, OracleError};

fn seed_of(request: &Value) -> Value {
    serde_json::from_str(request["messages"][1]["content"].as_str().unwrap()).unwrap()
}

/// An unknown field falls back to broad sampling; the oracle still answers.
#[tokio::test]
async fn e2e_unknown_field_uses_fallback_evidence() {
    let h = TestHarness::start().await;
    h.classifier_says(json!({"intent": "max_value", "target": "RSSI", "target_type": "field"}))
        .await;
    h.oracle_script(&[json!({"final_answer": "No RSSI data; here is what the log shows."})])
        .await;

    let reply = h
        .pipeline()
        .ask(&h.log, "What was the best signal strength?")
        .await
        .unwrap();
    assert_eq!(reply.message, "No RSSI data; here is what the log shows.");

    let seed = seed_of(&h.oracle_requests().await[0]);
    assert_eq!(seed["intent"], "fallback");
    assert_eq!(seed["extra_context"]["warning"], "Field 'rssi' not found");
    // Sampled from the priority list, only types present in the log.
    let sampled: Vec<&str> = seed["evidence"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|row| row["message_type"].as_str())
        .collect();
    assert!(sampled.contains(&"gps"));
    assert!(sampled.contains(&"err"));
    assert!(!sampled.contains(&"mode"));
}

/// value_at_time without a timestamp reaches the oracle as an error note.
#[tokio::test]
async fn e2e_missing_query_time_reported_in_context() {
    let h = TestHarness::start().await;
    h.classifier_says(json!({"intent": "value_at_time", "target": "Alt", "target_type": "field"}))
        .await;
    h.oracle_script(&[json!({
        "clarification_needed": true,
        "clarification_question": "At what time?"
    })])
    .await;

    let reply = h.pipeline().ask(&h.log, "What was the altitude then?").await.unwrap();
    assert!(reply.expecting_clarification);

    let context = reply.context.unwrap();
    assert!(context.bundle.is_error());
    assert_eq!(
        context.extra_context.error.as_deref(),
        Some("Missing query_time_us for value_at_time intent")
    );
    let seed = seed_of(&h.oracle_requests().await[0]);
    assert_eq!(seed["evidence"], Value::Null);
}

/// A failing answer oracle is fatal for the question.
#[tokio::test]
async fn e2e_oracle_http_error_surfaces() {
    let h = TestHarness::start().await;
    h.classifier_says(json!({"intent": "max_value", "target": "Alt", "target_type": "field"}))
        .await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({ "model": ORACLE_MODEL })))
        .respond_with(ResponseTemplate::new(502))
        .mount(&h.server)
        .await;

    let err = h.pipeline().ask(&h.log, "max altitude?").await.unwrap_err();
    assert!(matches!(err, AgentError::Oracle(OracleError::Status(502))));
}

/// A reply in none of the three shapes is a protocol violation.
#[tokio::test]
async fn e2e_oracle_protocol_violation() {
    let h = TestHarness::start().await;
    h.classifier_says(json!({"intent": "max_value", "target": "Alt", "target_type": "field"}))
        .await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({ "model": ORACLE_MODEL })))
        .respond_with(ollama_reply("The answer is 12 metres."))
        .mount(&h.server)
        .await;

    let err = h.pipeline().ask(&h.log, "max altitude?").await.unwrap_err();
    assert!(matches!(err, AgentError::Protocol(_)));
}

/// Unknown tools come back as a validation error and the loop continues.
#[tokio::test]
async fn e2e_unknown_tool_is_fed_back() {
    let h = TestHarness::start().await;
    h.classifier_says(json!({"intent": "min_value", "target": "Volt", "target_type": "field"}))
        .await;
    h.oracle_script(&[
        json!({"tool_calls": [{"tool": "plot_field", "args": {"field": "volt", "message_types": ["bat"]}}]}),
        json!({"final_answer": "Lowest voltage was 11.8 V."}),
    ])
    .await;

    let reply = h.pipeline().ask(&h.log, "lowest voltage?").await.unwrap();
    assert_eq!(reply.message, "Lowest voltage was 11.8 V.");

    let requests = h.oracle_requests().await;
    let fed_back: Value =
        serde_json::from_str(requests[1]["messages"][3]["content"].as_str().unwrap()).unwrap();
    assert_eq!(fed_back["tool_results"]["validation_error"], true);
    assert_eq!(
        fed_back["tool_results"]["errors"],
        json!(["Tool call 0: Unknown tool 'plot_field'"])
    );
    assert_eq!(
        fed_back["tool_results"]["available_tools"]
            .as_array()
            .unwrap()
            .len(),
        8
    );
}
