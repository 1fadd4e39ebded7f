//! Prompt and turn rendering for the answer oracle and the classifier.

use serde_json::{Value, json};

use sq_protocol::{EvidenceBundle, ExtraContext, TelemetryLog, Turn};
use sq_query_tools::{BatchOutcome, ToolInfo, ToolRegistry};

/// Appended to tool results once enough evidence has been gathered.
pub const FINAL_ANSWER_NOTE: &str = "Please provide your final answer based on these summaries.";

const ORACLE_FRAMING: &str = r#"You are a MAVLink flight-log analysis assistant.

Each question arrives as a JSON object with the original question
("original_question"), the classified "intent" and "field", the
"candidate_messages" searched, pre-computed "evidence", and any
"extra_context" (query_time_us, unavailable sources, notes, errors).

If the evidence lets you answer accurately, give a final answer. Even when
no anomalies or events were found, describe how the data behaves (range,
consistency, change points). Use summarize_field, get_change_points or
resample_evidence when that context is missing.

If you cannot answer confidently you may ask the user one clarification
question, or request one or more tool calls.

Respond with exactly one JSON object in one of these shapes:

{"clarification_needed": true, "clarification_question": "..."}

{"clarification_needed": false, "tool_calls": [{"tool": "<name>", "args": {...}}]}

{"clarification_needed": false, "tool_calls": [], "final_answer": "..."}

Never mix a clarification, tool calls and a final answer in one reply.

Rules:
- Use only the tools listed below, with argument names exactly as listed.
- Every tool call needs "field" and "message_types".
- Put at most 20 message types in a single call.
- Prefer message types known to carry the target field.
- Do not repeat a tool call you have already made."#;

/// System framing for the answer oracle. Rebuilt from the log every round.
pub fn system_prompt(log: &TelemetryLog, registry: &ToolRegistry) -> String {
    let message_types: Vec<&str> = log.message_types().collect();
    let mut prompt = String::from(ORACLE_FRAMING);
    prompt.push_str("\n- Only use message types from this list: ");
    prompt.push_str(&message_types.join(", "));
    prompt.push_str("\n\nAvailable tools:\n");
    for (i, tool) in registry.list_tools().iter().enumerate() {
        prompt.push('\n');
        prompt.push_str(&render_tool(i + 1, tool));
    }
    prompt
}

fn render_tool(position: usize, tool: &ToolInfo) -> String {
    let mut out = format!("{position}. {} - {}\n", tool.name, tool.description);
    let required: Vec<&str> = tool.schema["required"]
        .as_array()
        .map(|r| r.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    match tool.schema["properties"].as_object() {
        Some(props) if !props.is_empty() => {
            out.push_str("   Args:\n");
            for (name, spec) in props {
                let kind = spec["type"].as_str().unwrap_or("any");
                let optional = if required.contains(&name.as_str()) {
                    ""
                } else {
                    ", optional"
                };
                let description = spec["description"].as_str().unwrap_or_default();
                out.push_str(&format!("     - {name} ({kind}{optional}) {description}\n"));
            }
        }
        _ => out.push_str("   Args: none\n"),
    }
    out
}

/// Opening user turn: question, classification and evidence as pretty JSON.
pub fn seed_turn(question: &str, bundle: &EvidenceBundle, extra: &ExtraContext) -> Turn {
    let seed = json!({
        "original_question": question,
        "intent": bundle.intent,
        "field": bundle.field,
        "candidate_messages": bundle.candidate_messages,
        "evidence": bundle.evidence,
        "extra_context": extra,
    });
    Turn::user(pretty(&seed))
}

/// Tool results fed back to the oracle; `sufficient` asks it to conclude.
pub fn tool_results_turn(outcome: &BatchOutcome, sufficient: bool) -> Turn {
    let content = if sufficient {
        json!({ "tool_results": outcome, "note": FINAL_ANSWER_NOTE })
    } else {
        json!({ "tool_results": outcome })
    };
    Turn::user(pretty(&content))
}

/// Why the loop stopped, recorded as the last turn.
pub fn stop_turn(reason: &str) -> Turn {
    Turn::assistant(pretty(&json!({ "reason": reason })))
}

pub(crate) fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// System prompt for the intent classifier.
pub const CLASSIFIER_PROMPT: &str = r#"You classify questions about drone flight logs (ArduPilot DataFlash telemetry).

Return one JSON object with:

1. "intent", one of:
   max_value, min_value, event_detection, time_duration, value_at_time,
   summary, change_detection, anomaly_detection

2. "target": the telemetry message type or field that best answers the
   question. For system events (GPS loss, arming, mode changes, failsafes)
   pick the message type holding the clearest evidence, such as ERR or MODE.

3. "target_type":
   - "message" for discrete events, states or logs (GPS, ARM, MODE, ERR)
   - "field" for continuous measurements (Alt, Curr, Volt, Temp)

4. "query_time_us" (optional): when the question asks about one moment,
   that moment in microseconds (1 s = 1000000 us). Omit otherwise.

Use real ArduPilot message and field names only. Never invent combined
names such as gps_speed or battery_voltage: "gps speed" is Spd, "battery
voltage" is Volt, "signal strength" is RSSI. Prefer ERR for signal loss
and other system issues.

Examples:
"What was the highest altitude reached?" -> {"intent": "max_value", "target": "Alt", "target_type": "field"}
"When did the GPS signal first get lost?" -> {"intent": "event_detection", "target": "GPS", "target_type": "message"}
"How long was the flight?" -> {"intent": "time_duration", "target": "TimeUS", "target_type": "field"}
"What was the battery voltage 90 seconds in?" -> {"intent": "value_at_time", "target": "Volt", "target_type": "field", "query_time_us": 90000000}
"List all critical errors mid-flight." -> {"intent": "event_detection", "target": "ERR", "target_type": "message"}"#;
