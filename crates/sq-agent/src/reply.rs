//! Decoding of answer-oracle replies into one of the three allowed shapes.

use serde_json::Value;

use sq_protocol::ToolCall;

use crate::error::{AgentError, AgentResult};
use crate::oracle::extract_json;

/// Used when the oracle asks for clarification without saying what.
pub const DEFAULT_CLARIFICATION: &str = "Can you clarify your question?";

/// A decoded oracle reply.
#[derive(Debug, Clone, PartialEq)]
pub enum OracleReply {
    Clarification { question: String },
    /// Possibly empty; an empty batch ends the session as incomplete.
    ToolCalls(Vec<ToolCall>),
    FinalAnswer(String),
}

/// A reply plus the JSON it was decoded from (kept for the conversation).
#[derive(Debug, Clone)]
pub struct DecodedReply {
    pub reply: OracleReply,
    pub content: Value,
}

impl OracleReply {
    /// Decode raw oracle text.
    ///
    /// Precedence when shapes are mixed: clarification, then a non-empty
    /// tool batch, then a non-empty final answer, then an empty tool batch.
    /// Anything else is a protocol violation.
    pub fn decode(raw: &str) -> AgentResult<DecodedReply> {
        let content: Value = serde_json::from_str(extract_json(raw))
            .map_err(|e| AgentError::Protocol(format!("reply is not JSON: {e}")))?;
        let Some(object) = content.as_object() else {
            return Err(AgentError::Protocol("reply is not a JSON object".into()));
        };

        if object
            .get("clarification_needed")
            .and_then(Value::as_bool)
            .unwrap_or(false)
        {
            let question = object
                .get("clarification_question")
                .and_then(Value::as_str)
                .filter(|q| !q.trim().is_empty())
                .unwrap_or(DEFAULT_CLARIFICATION)
                .to_string();
            return Ok(DecodedReply {
                reply: Self::Clarification { question },
                content,
            });
        }

        let calls = match object.get("tool_calls") {
            None | Some(Value::Null) => None,
            Some(Value::Array(items)) => Some(items.iter().map(decode_call).collect::<Vec<_>>()),
            Some(other) => {
                return Err(AgentError::Protocol(format!(
                    "tool_calls must be an array, got {other}"
                )));
            }
        };

        let answer = object
            .get("final_answer")
            .and_then(Value::as_str)
            .filter(|a| !a.trim().is_empty())
            .map(str::to_string);

        let reply = match (calls, answer) {
            (Some(calls), _) if !calls.is_empty() => Self::ToolCalls(calls),
            (_, Some(answer)) => Self::FinalAnswer(answer),
            (Some(empty), None) => Self::ToolCalls(empty),
            (None, None) => {
                return Err(AgentError::Protocol(
                    "reply has no clarification, tool_calls or final_answer".into(),
                ));
            }
        };
        Ok(DecodedReply { reply, content })
    }
}

/// Malformed entries become calls with no tool name; validation reports them.
fn decode_call(item: &Value) -> ToolCall {
    serde_json::from_value(item.clone()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(raw: &str) -> OracleReply {
        OracleReply::decode(raw).unwrap().reply
    }

    #[test]
    fn clarification_with_default_question() {
        assert_eq!(
            decode(r#"{"clarification_needed": true}"#),
            OracleReply::Clarification {
                question: DEFAULT_CLARIFICATION.into()
            }
        );
        assert_eq!(
            decode(r#"{"clarification_needed": true, "clarification_question": "Which GPS?"}"#),
            OracleReply::Clarification {
                question: "Which GPS?".into()
            }
        );
    }

    #[test]
    fn tool_calls_decoded() {
        let reply = decode(
            r#"{"clarification_needed": false,
                "tool_calls": [{"tool": "summarize_field", "args": {"field": "alt", "message_types": ["gps"]}}]}"#,
        );
        let OracleReply::ToolCalls(calls) = reply else {
            panic!("expected tool calls");
        };
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].tool, "summarize_field");
        assert_eq!(calls[0].field(), Some("alt"));
    }

    #[test]
    fn final_answer_beats_empty_tool_batch() {
        assert_eq!(
            decode(r#"{"clarification_needed": false, "tool_calls": [], "final_answer": "12 m"}"#),
            OracleReply::FinalAnswer("12 m".into())
        );
        assert_eq!(
            decode(r#"{"tool_calls": []}"#),
            OracleReply::ToolCalls(Vec::new())
        );
    }

    #[test]
    fn fenced_reply_is_accepted() {
        assert_eq!(
            decode("```json\n{\"final_answer\": \"done\"}\n```"),
            OracleReply::FinalAnswer("done".into())
        );
    }

    #[test]
    fn malformed_call_keeps_its_slot() {
        let OracleReply::ToolCalls(calls) = decode(r#"{"tool_calls": ["oops"]}"#) else {
            panic!("expected tool calls");
        };
        assert_eq!(calls, vec![ToolCall::default()]);
    }

    #[test]
    fn other_shapes_are_protocol_errors() {
        for raw in [
            "not json",
            "[1, 2]",
            r#"{"answer": "12"}"#,
            r#"{"final_answer": ""}"#,
            r#"{"tool_calls": "summarize_field"}"#,
        ] {
            assert!(
                matches!(OracleReply::decode(raw), Err(AgentError::Protocol(_))),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn content_is_preserved() {
        let decoded = OracleReply::decode(r#"{"final_answer": "ok", "confidence": 0.9}"#).unwrap();
        assert_eq!(decoded.content["confidence"], 0.9);
    }
}
