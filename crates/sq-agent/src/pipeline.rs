//! Question → classification → evidence → agent loop → user-facing reply.

use tracing::info;

use sq_evidence::EvidenceEngine;
use sq_protocol::{
    AgentOutcome, ChatReply, ClarificationContext, EvidenceBundle, ExtraContext, TelemetryLog,
};

use crate::agent::AgentLoop;
use crate::classifier::IntentClassifier;
use crate::error::AgentResult;

/// Shown when an incomplete session carries no reason.
pub const DEFAULT_INCOMPLETE: &str = "Could not complete reasoning.";

pub struct QueryPipeline {
    classifier: Box<dyn IntentClassifier>,
    engine: EvidenceEngine,
    agent: AgentLoop,
}

impl QueryPipeline {
    pub fn new(classifier: Box<dyn IntentClassifier>, engine: EvidenceEngine, agent: AgentLoop) -> Self {
        Self {
            classifier,
            engine,
            agent,
        }
    }

    /// Answer a fresh question about `log`.
    pub async fn ask(&self, log: &TelemetryLog, question: &str) -> AgentResult<ChatReply> {
        let classification = self.classifier.classify(question, self.engine.catalog()).await;
        let bundle = self.engine.dispatch(&classification, log);
        let extra = ExtraContext::from_bundle(&bundle);
        info!(
            intent = %bundle.intent,
            field = ?bundle.field,
            candidates = bundle.candidate_messages.len(),
            has_evidence = bundle.has_evidence(),
            "evidence dispatched"
        );

        let outcome = self.agent.run(log, question, &bundle, &extra).await?;
        Ok(reply_for(outcome, bundle, extra))
    }

    /// Resume after the user answered a clarification question.
    pub async fn clarify(
        &self,
        log: &TelemetryLog,
        context: ClarificationContext,
        reply: &str,
    ) -> AgentResult<ChatReply> {
        let ClarificationContext {
            conversation,
            bundle,
            extra_context,
        } = context;
        let outcome = self.agent.resume(log, conversation, reply).await?;
        Ok(reply_for(outcome, bundle, extra_context))
    }
}

fn reply_for(outcome: AgentOutcome, bundle: EvidenceBundle, extra_context: ExtraContext) -> ChatReply {
    match outcome {
        AgentOutcome::Answered { answer, .. } => ChatReply {
            message: answer,
            expecting_clarification: false,
            context: None,
        },
        AgentOutcome::ClarificationRequested {
            question,
            conversation,
        } => ChatReply {
            message: question,
            expecting_clarification: true,
            context: Some(ClarificationContext {
                conversation,
                bundle,
                extra_context,
            }),
        },
        AgentOutcome::Incomplete { reason, .. } => ChatReply {
            message: if reason.trim().is_empty() {
                DEFAULT_INCOMPLETE.to_string()
            } else {
                reason
            },
            expecting_clarification: false,
            context: None,
        },
    }
}
