//! SkyQuery agent: ask natural-language questions about a flight log.
//!
//! Usage: `sq-agent <config.toml> <log.json> <question...>`
//!
//! Prints each reply as JSON on stdout. When the reply asks for
//! clarification, the next stdin line is sent back as the answer.

use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use sq_agent::agent::AgentLoop;
use sq_agent::classifier::{DisabledClassifier, IntentClassifier, LlmClassifier};
use sq_agent::config::AgentConfig;
use sq_agent::oracle::ChatClient;
use sq_agent::pipeline::QueryPipeline;
use sq_evidence::{EvidenceEngine, FieldCatalog};
use sq_protocol::TelemetryLog;
use sq_query_tools::ToolRegistry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "sq-agent starting");

    let mut args = std::env::args().skip(1);
    let (Some(config_path), Some(log_path)) = (args.next(), args.next()) else {
        anyhow::bail!("usage: sq-agent <config.toml> <log.json> <question...>");
    };
    let question = args.collect::<Vec<_>>().join(" ");
    if question.trim().is_empty() {
        anyhow::bail!("no question given");
    }

    // ── Load config ─────────────────────────────────────────────
    let config = AgentConfig::from_file(&config_path)?.apply_env();
    tracing::info!(
        oracle = %config.oracle.model,
        classifier = %config.classifier.model,
        max_rounds = config.limits.max_rounds,
        "config loaded"
    );
    if !config.oracle.enabled {
        anyhow::bail!("answer oracle is disabled in {config_path}");
    }

    // ── Load telemetry log ──────────────────────────────────────
    let raw = std::fs::read_to_string(&log_path)
        .with_context(|| format!("reading telemetry log {log_path}"))?;
    let log = TelemetryLog::from_json_str(&raw)
        .with_context(|| format!("parsing telemetry log {log_path}"))?;
    tracing::info!(message_types = log.len(), "telemetry log loaded");

    // ── Field catalog ───────────────────────────────────────────
    let catalog = match &config.catalog_path {
        Some(path) => FieldCatalog::from_file(path)?,
        None => FieldCatalog::from_log(&log),
    };
    tracing::info!(message_types = catalog.len(), "field catalog ready");

    // ── Oracles ─────────────────────────────────────────────────
    let classifier: Box<dyn IntentClassifier> = if config.classifier.enabled {
        tracing::info!(
            host = %config.classifier.host,
            model = %config.classifier.model,
            "intent classifier enabled"
        );
        Box::new(LlmClassifier::new(ChatClient::new(
            config.classifier.chat_config(),
        )?))
    } else {
        tracing::info!("intent classifier disabled, using fallback evidence");
        Box::new(DisabledClassifier)
    };
    let oracle = Arc::new(ChatClient::new(config.oracle.clone())?);

    let registry = ToolRegistry::with_defaults();
    tracing::info!(tool_count = registry.len(), "tool registry initialized");

    let pipeline = QueryPipeline::new(
        classifier,
        EvidenceEngine::new(catalog),
        AgentLoop::new(oracle, registry, config.limits),
    );

    // ── Ask, clarifying until done ──────────────────────────────
    let mut reply = pipeline.ask(&log, &question).await?;
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    loop {
        println!("{}", serde_json::to_string_pretty(&reply)?);
        let Some(context) = reply.context.take().filter(|_| reply.expecting_clarification) else {
            break;
        };
        let Some(answer) = stdin.next_line().await? else {
            tracing::info!("stdin closed before clarification");
            break;
        };
        reply = pipeline.clarify(&log, context, answer.trim()).await?;
    }

    Ok(())
}
