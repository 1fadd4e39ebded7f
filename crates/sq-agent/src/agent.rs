//! Bounded agentic loop between the answer oracle and the query tools.
//!
//! Each round sends the conversation to the oracle and acts on its reply:
//! a clarification request or final answer ends the session, a tool batch
//! is filtered, executed and fed back. Budget exhaustion or a batch with
//! nothing new in it ends the session as `incomplete`.

use std::sync::Arc;

use serde_json::Value;
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

use sq_protocol::{AgentOutcome, EvidenceBundle, ExtraContext, TelemetryLog, Turn};
use sq_query_tools::{BatchOutcome, ToolName, ToolRegistry};

use crate::config::LoopLimits;
use crate::error::AgentResult;
use crate::oracle::AnswerOracle;
use crate::prompt;
use crate::reply::OracleReply;
use crate::session::{AgentSession, admit_calls};

/// Recorded when a tool batch has nothing admissible left in it.
pub const NO_NEW_CALLS: &str = "No valid or new tool calls";

/// Reported when the round budget runs out.
pub const OUT_OF_ROUNDS: &str = "Couldn't complete the reasoning chain in allotted steps.";

pub struct AgentLoop {
    oracle: Arc<dyn AnswerOracle>,
    registry: ToolRegistry,
    limits: LoopLimits,
}

impl AgentLoop {
    pub fn new(oracle: Arc<dyn AnswerOracle>, registry: ToolRegistry, limits: LoopLimits) -> Self {
        Self {
            oracle,
            registry,
            limits,
        }
    }

    pub fn limits(&self) -> LoopLimits {
        self.limits
    }

    /// Start a session from classified evidence.
    pub async fn run(
        &self,
        log: &TelemetryLog,
        question: &str,
        bundle: &EvidenceBundle,
        extra: &ExtraContext,
    ) -> AgentResult<AgentOutcome> {
        let session = AgentSession::start(vec![prompt::seed_turn(question, bundle, extra)]);
        let span = info_span!("agent_session", session_id = %Uuid::now_v7(), intent = %bundle.intent);
        self.drive(log, session).instrument(span).await
    }

    /// Continue a conversation that ended in a clarification request.
    /// Counters and attempted calls start over.
    pub async fn resume(
        &self,
        log: &TelemetryLog,
        conversation: Vec<Turn>,
        reply: &str,
    ) -> AgentResult<AgentOutcome> {
        let session = AgentSession::start(conversation).with_turn(Turn::user(reply));
        let span = info_span!("agent_session", session_id = %Uuid::now_v7(), resumed = true);
        self.drive(log, session).instrument(span).await
    }

    async fn drive(&self, log: &TelemetryLog, mut session: AgentSession) -> AgentResult<AgentOutcome> {
        let system = prompt::system_prompt(log, &self.registry);
        let known_fields = log.field_names();

        while session.rounds() < self.limits.max_rounds {
            session = session.next_round();
            let round = session.rounds();
            info!(round, oracle = self.oracle.name(), "querying answer oracle");

            let raw = self.oracle.respond(&system, session.conversation()).await?;
            let decoded = OracleReply::decode(&raw).inspect_err(|e| {
                warn!(round, error = %e, "unusable oracle reply");
            })?;
            session = session.with_turn(Turn::assistant(prompt::pretty(&decoded.content)));

            match decoded.reply {
                OracleReply::Clarification { question } => {
                    info!(round, "oracle requested clarification");
                    return Ok(AgentOutcome::ClarificationRequested {
                        question,
                        conversation: session.into_conversation(),
                    });
                }
                OracleReply::FinalAnswer(answer) => {
                    info!(round, "oracle answered");
                    return Ok(AgentOutcome::Answered {
                        answer,
                        conversation: session.into_conversation(),
                    });
                }
                OracleReply::ToolCalls(calls) => {
                    let requested = calls.len();
                    let (admitted, keys) = admit_calls(calls, &session, &known_fields);
                    if admitted.is_empty() {
                        info!(round, requested, "no valid or new tool calls, stopping");
                        session = session.with_turn(prompt::stop_turn(NO_NEW_CALLS));
                        return Ok(AgentOutcome::Incomplete {
                            reason: format!("Stopped early: {NO_NEW_CALLS}"),
                            conversation: session.into_conversation(),
                        });
                    }

                    let outcome = self.registry.execute_batch(&admitted, log);
                    let useful = useful_summaries(&outcome);
                    session = session.with_attempted(keys).with_summaries(useful);

                    let sufficient = session.successful_summaries()
                        >= self.limits.sufficient_summaries
                        || round >= self.limits.max_rounds;
                    info!(
                        round,
                        requested,
                        executed = admitted.len(),
                        useful,
                        sufficient,
                        "tool batch executed"
                    );
                    session = session.with_turn(prompt::tool_results_turn(&outcome, sufficient));
                }
            }
        }

        info!(rounds = session.rounds(), "round budget exhausted");
        Ok(AgentOutcome::Incomplete {
            reason: OUT_OF_ROUNDS.into(),
            conversation: session.into_conversation(),
        })
    }
}

/// summarize_field results that produced a numeric mean.
fn useful_summaries(outcome: &BatchOutcome) -> u32 {
    outcome
        .results(ToolName::SummarizeField)
        .iter()
        .filter(|r| r.get("mean").is_some_and(Value::is_number))
        .count() as u32
}
