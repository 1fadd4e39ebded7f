//! Tool registry: validation and panic-free batch execution.
//!
//! The agent loop hands every tool-call batch from the answer oracle to
//! this registry. A batch is either rejected as a whole (unknown or
//! missing tool names) or executed call by call, with per-call failures
//! folded into that call's result slot.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

use sq_protocol::{TelemetryLog, ToolCall};

use crate::types::{QueryTool, ToolName};

/// Metadata about a registered tool (rendered into the oracle prompt).
#[derive(Debug, Clone, Serialize)]
pub struct ToolInfo {
    pub name: ToolName,
    pub description: String,
    pub schema: Value,
}

/// Why a batch was refused without running any of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationFailure {
    pub validation_error: bool,
    pub errors: Vec<String>,
    pub available_tools: Vec<String>,
}

/// Result of handing a batch to the registry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BatchOutcome {
    Rejected(ValidationFailure),
    /// Tool name → one result per call, in call order.
    Executed(BTreeMap<String, Vec<Value>>),
}

impl BatchOutcome {
    /// Results produced by one tool; empty when rejected or not called.
    pub fn results(&self, tool: ToolName) -> &[Value] {
        match self {
            Self::Executed(by_tool) => by_tool
                .get(tool.as_str())
                .map(Vec::as_slice)
                .unwrap_or(&[]),
            Self::Rejected(_) => &[],
        }
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// All query tools, indexed by name.
pub struct ToolRegistry {
    tools: Vec<Box<dyn QueryTool>>,
    index: HashMap<ToolName, usize>,
}

impl ToolRegistry {
    pub fn new(tools: Vec<Box<dyn QueryTool>>) -> Self {
        let index = tools
            .iter()
            .enumerate()
            .map(|(i, tool)| (tool.name(), i))
            .collect();
        Self { tools, index }
    }

    /// Registry holding every tool in `ToolName::ALL`.
    pub fn with_defaults() -> Self {
        Self::new(crate::tools::all_tools())
    }

    pub fn lookup(&self, name: &str) -> Option<&dyn QueryTool> {
        let name: ToolName = name.parse().ok()?;
        self.get(name)
    }

    pub fn get(&self, name: ToolName) -> Option<&dyn QueryTool> {
        self.index.get(&name).map(|&i| self.tools[i].as_ref())
    }

    pub fn names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.name().to_string()).collect()
    }

    pub fn list_tools(&self) -> Vec<ToolInfo> {
        self.tools
            .iter()
            .map(|tool| ToolInfo {
                name: tool.name(),
                description: tool.description().to_string(),
                schema: tool.parameters_schema(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Resolve every call's tool, or report every problem at once.
    pub fn validate<'c>(
        &self,
        calls: &'c [ToolCall],
    ) -> Result<Vec<(&dyn QueryTool, &'c ToolCall)>, ValidationFailure> {
        let mut errors = Vec::new();
        let mut resolved = Vec::with_capacity(calls.len());

        for (i, call) in calls.iter().enumerate() {
            if call.tool.is_empty() {
                errors.push(format!("Tool call {i}: Missing 'tool' field"));
            } else if let Some(tool) = self.lookup(&call.tool) {
                resolved.push((tool, call));
            } else {
                errors.push(format!("Tool call {i}: Unknown tool '{}'", call.tool));
            }
        }

        if errors.is_empty() {
            Ok(resolved)
        } else {
            Err(ValidationFailure {
                validation_error: true,
                errors,
                available_tools: self.names(),
            })
        }
    }

    /// Run one tool. Failures become `{"error": ...}`.
    pub fn execute(&self, tool: &dyn QueryTool, args: &Value, log: &TelemetryLog) -> Value {
        match tool.execute(args, log) {
            Ok(result) => {
                debug!(tool = %tool.name(), "tool succeeded");
                result
            }
            Err(e) => {
                debug!(tool = %tool.name(), error = %e, "tool failed");
                e.to_slot()
            }
        }
    }

    /// Validate then execute a batch. Never fails.
    pub fn execute_batch(&self, calls: &[ToolCall], log: &TelemetryLog) -> BatchOutcome {
        let resolved = match self.validate(calls) {
            Ok(resolved) => resolved,
            Err(failure) => {
                warn!(errors = ?failure.errors, "tool batch rejected");
                return BatchOutcome::Rejected(failure);
            }
        };

        let mut results: BTreeMap<String, Vec<Value>> = BTreeMap::new();
        for (tool, call) in resolved {
            let args = Value::Object(call.args.clone());
            let result = self.execute(tool, &args, log);
            results
                .entry(tool.name().to_string())
                .or_default()
                .push(result);
        }
        BatchOutcome::Executed(results)
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
