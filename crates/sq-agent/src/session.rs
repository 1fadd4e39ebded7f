//! Per-query agent state, threaded through the loop by value.

use std::collections::BTreeSet;

use sq_protocol::{ToolCall, Turn};

/// Identity of a tool request for duplicate suppression:
/// lower-cased field plus lower-cased message types in call order.
pub type CallKey = (String, Vec<String>);

/// State of one agent session. Every transition consumes the session and
/// returns the next one; nothing is shared between sessions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AgentSession {
    conversation: Vec<Turn>,
    attempted: BTreeSet<CallKey>,
    rounds: u32,
    successful_summaries: u32,
}

impl AgentSession {
    /// Fresh session over an existing conversation.
    pub fn start(conversation: Vec<Turn>) -> Self {
        Self {
            conversation,
            ..Self::default()
        }
    }

    pub fn conversation(&self) -> &[Turn] {
        &self.conversation
    }

    pub fn into_conversation(self) -> Vec<Turn> {
        self.conversation
    }

    pub fn rounds(&self) -> u32 {
        self.rounds
    }

    pub fn successful_summaries(&self) -> u32 {
        self.successful_summaries
    }

    pub fn has_attempted(&self, key: &CallKey) -> bool {
        self.attempted.contains(key)
    }

    pub fn with_turn(mut self, turn: Turn) -> Self {
        self.conversation.push(turn);
        self
    }

    pub fn next_round(mut self) -> Self {
        self.rounds += 1;
        self
    }

    /// Attempted keys only ever grow.
    pub fn with_attempted(mut self, keys: impl IntoIterator<Item = CallKey>) -> Self {
        self.attempted.extend(keys);
        self
    }

    pub fn with_summaries(mut self, useful: u32) -> Self {
        self.successful_summaries += useful;
        self
    }
}

/// Dedup key for a call, or `None` if it lacks `field` or `message_types`.
pub fn call_key(call: &ToolCall) -> Option<CallKey> {
    let field = call.field()?.to_lowercase();
    let messages = call.message_types();
    if messages.is_empty() {
        return None;
    }
    Some((field, messages.iter().map(|m| m.to_lowercase()).collect()))
}

/// Drop calls that lack a field or message types, repeat an attempted
/// key (including earlier in the same batch), or name a field the log
/// does not carry. Returns the survivors and their keys.
pub fn admit_calls(
    calls: Vec<ToolCall>,
    session: &AgentSession,
    known_fields: &BTreeSet<String>,
) -> (Vec<ToolCall>, Vec<CallKey>) {
    let mut admitted = Vec::new();
    let mut keys: Vec<CallKey> = Vec::new();

    for call in calls {
        let Some(key) = call_key(&call) else {
            tracing::debug!(tool = %call.tool, "dropping call without field or message_types");
            continue;
        };
        if session.has_attempted(&key) || keys.contains(&key) {
            tracing::debug!(tool = %call.tool, field = %key.0, "dropping repeated call");
            continue;
        }
        if !known_fields.contains(&key.0) {
            tracing::debug!(tool = %call.tool, field = %key.0, "dropping call for unknown field");
            continue;
        }
        keys.push(key);
        admitted.push(call);
    }
    (admitted, keys)
}
