use serde::{Deserialize, Serialize};

use crate::evidence::{EvidenceBundle, ExtraContext};

/// Speaker of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One entry of the answer-oracle conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
}

/// A tool request as emitted by the answer oracle, before validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    #[serde(default)]
    pub tool: String,
    #[serde(default)]
    pub args: serde_json::Map<String, serde_json::Value>,
}

impl ToolCall {
    pub fn new(tool: impl Into<String>, args: serde_json::Value) -> Self {
        Self {
            tool: tool.into(),
            args: match args {
                serde_json::Value::Object(map) => map,
                _ => serde_json::Map::new(),
            },
        }
    }

    /// Non-empty `field` argument, if any.
    pub fn field(&self) -> Option<&str> {
        self.args
            .get("field")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
    }

    /// `message_types` argument as strings; non-string entries are skipped.
    pub fn message_types(&self) -> Vec<String> {
        self.args
            .get("message_types")
            .and_then(|v| v.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Terminal result of one agent-loop invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AgentOutcome {
    Answered {
        answer: String,
        conversation: Vec<Turn>,
    },
    ClarificationRequested {
        question: String,
        conversation: Vec<Turn>,
    },
    /// Round budget exhausted or no new tool calls; never an exception.
    Incomplete {
        reason: String,
        conversation: Vec<Turn>,
    },
}

impl AgentOutcome {
    pub fn conversation(&self) -> &[Turn] {
        match self {
            Self::Answered { conversation, .. }
            | Self::ClarificationRequested { conversation, .. }
            | Self::Incomplete { conversation, .. } => conversation,
        }
    }

    pub fn status(&self) -> &'static str {
        match self {
            Self::Answered { .. } => "answered",
            Self::ClarificationRequested { .. } => "clarification_requested",
            Self::Incomplete { .. } => "incomplete",
        }
    }
}

/// Everything needed to resume a conversation after the user answers a
/// clarification question. Nothing else is required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClarificationContext {
    pub conversation: Vec<Turn>,
    pub bundle: EvidenceBundle,
    #[serde(default)]
    pub extra_context: ExtraContext,
}

/// User-facing reply shape produced by the orchestration layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub message: String,
    pub expecting_clarification: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<ClarificationContext>,
}
