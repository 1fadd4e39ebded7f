//! Agent configuration, loadable from TOML with environment overrides.

use serde::Deserialize;

/// Top-level configuration for the `sq-agent` binary.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AgentConfig {
    /// Answer oracle (multi-round chat model).
    #[serde(default)]
    pub oracle: OracleConfig,
    /// Intent classifier model.
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub limits: LoopLimits,
    /// Message-definitions JSON. None derives the catalog from the log.
    #[serde(default)]
    pub catalog_path: Option<String>,
}

impl AgentConfig {
    /// Load config from a TOML file path.
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Apply `SQ_ORACLE_HOST` / `SQ_ORACLE_MODEL` when set. The host
    /// override applies to the classifier too.
    pub fn apply_env(mut self) -> Self {
        if let Ok(host) = std::env::var("SQ_ORACLE_HOST") {
            self.oracle.host = host.clone();
            self.classifier.host = host;
        }
        if let Ok(model) = std::env::var("SQ_ORACLE_MODEL") {
            self.oracle.model = model;
        }
        self
    }
}

/// Chat endpoint settings (Ollama `/api/chat`).
#[derive(Debug, Clone, Deserialize)]
pub struct OracleConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    /// Per-request timeout in seconds. None waits indefinitely.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

/// Same shape as `OracleConfig`, with a smaller default model.
#[derive(Debug, Clone, Deserialize)]
pub struct ClassifierConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_classifier_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    /// When false every question is answered from fallback evidence.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl ClassifierConfig {
    pub fn chat_config(&self) -> OracleConfig {
        OracleConfig {
            host: self.host.clone(),
            model: self.model.clone(),
            temperature: self.temperature,
            timeout_secs: self.timeout_secs,
            enabled: self.enabled,
        }
    }
}

/// Bounds on one agent session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct LoopLimits {
    #[serde(default = "default_max_rounds")]
    pub max_rounds: u32,
    /// Useful summaries after which the oracle is asked to conclude.
    #[serde(default = "default_sufficient_summaries")]
    pub sufficient_summaries: u32,
}

fn default_host() -> String {
    "http://localhost:11434".into()
}
fn default_model() -> String {
    "llama3.1:8b".into()
}
fn default_classifier_model() -> String {
    "llama3.2:3b".into()
}
fn default_temperature() -> f64 {
    0.2
}
fn default_enabled() -> bool {
    true
}
fn default_max_rounds() -> u32 {
    10
}
fn default_sufficient_summaries() -> u32 {
    2
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            model: default_model(),
            temperature: default_temperature(),
            timeout_secs: None,
            enabled: default_enabled(),
        }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            model: default_classifier_model(),
            temperature: default_temperature(),
            timeout_secs: None,
            enabled: default_enabled(),
        }
    }
}

impl Default for LoopLimits {
    fn default() -> Self {
        Self {
            max_rounds: default_max_rounds(),
            sufficient_summaries: default_sufficient_summaries(),
        }
    }
}
