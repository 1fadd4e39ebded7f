//! Shared test harness for E2E integration tests.
//!
//! Runs the real pipeline (HTTP classifier, evidence engine, agent loop,
//! HTTP answer oracle) against a wiremock Ollama server.

#![allow(dead_code)]

use serde_json::{Value, json};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sq_agent::QueryPipeline;
use sq_agent::agent::AgentLoop;
use sq_agent::classifier::LlmClassifier;
use sq_agent::config::{AgentConfig, ClassifierConfig, LoopLimits, OracleConfig};
use sq_agent::oracle::ChatClient;
use sq_evidence::{EvidenceEngine, FieldCatalog, fixtures};
use sq_protocol::TelemetryLog;
use sq_query_tools::ToolRegistry;

pub const ORACLE_MODEL: &str = "llama3.1:8b";
pub const CLASSIFIER_MODEL: &str = "llama3.2:3b";

/// One mock Ollama server serving both models, plus the sample flight log.
pub struct TestHarness {
    pub server: MockServer,
    pub log: TelemetryLog,
    pub catalog: FieldCatalog,
}

impl TestHarness {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
            log: fixtures::sample_flight_log(),
            catalog: fixtures::sample_catalog(),
        }
    }

    /// Config pointing both models at the mock server.
    pub fn config(&self) -> AgentConfig {
        AgentConfig {
            oracle: OracleConfig {
                host: self.server.uri(),
                timeout_secs: Some(5),
                ..OracleConfig::default()
            },
            classifier: ClassifierConfig {
                host: self.server.uri(),
                timeout_secs: Some(5),
                ..ClassifierConfig::default()
            },
            limits: LoopLimits::default(),
            catalog_path: None,
        }
    }

    /// The production pipeline wired to the mock server.
    pub fn pipeline(&self) -> QueryPipeline {
        let config = self.config();
        let classifier = LlmClassifier::new(ChatClient::new(config.classifier.chat_config()).unwrap());
        let oracle = ChatClient::new(config.oracle).unwrap();
        QueryPipeline::new(
            Box::new(classifier),
            EvidenceEngine::new(self.catalog.clone()),
            AgentLoop::new(
                std::sync::Arc::new(oracle),
                ToolRegistry::with_defaults(),
                config.limits,
            ),
        )
    }

    /// Classifier answers every question with `classification`.
    pub async fn classifier_says(&self, classification: Value) {
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_partial_json(json!({ "model": CLASSIFIER_MODEL })))
            .respond_with(ollama_reply(&classification.to_string()))
            .mount(&self.server)
            .await;
    }

    /// Answer oracle replies with `replies`, one per request, in order.
    pub async fn oracle_script(&self, replies: &[Value]) {
        for reply in replies {
            Mock::given(method("POST"))
                .and(path("/api/chat"))
                .and(body_partial_json(json!({ "model": ORACLE_MODEL })))
                .respond_with(ollama_reply(&reply.to_string()))
                .up_to_n_times(1)
                .mount(&self.server)
                .await;
        }
    }

    /// Bodies of every request sent to the answer oracle, in order.
    pub async fn oracle_requests(&self) -> Vec<Value> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter_map(|r| serde_json::from_slice::<Value>(&r.body).ok())
            .filter(|body| body["model"] == ORACLE_MODEL)
            .collect()
    }
}

/// Ollama `/api/chat` response carrying `content`.
pub fn ollama_reply(content: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "message": { "role": "assistant", "content": content },
        "done": true
    }))
}
