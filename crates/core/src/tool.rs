//! Tool trait, registry, and argument validation.
//!
//! Tools are the actions the model may request: weather lookups, currency
//! math, catalog searches. Each is a flat, stateless function behind the
//! [`Tool`] trait. The registry is populated once at startup and read-only
//! afterwards; during a run it is shared behind an `Arc`.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ToolError;

/// A request to execute a tool, created by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique call ID within one assistant turn.
    pub id: String,

    /// Name of the tool to execute.
    pub name: String,

    /// Arguments as a JSON object.
    pub arguments: serde_json::Value,
}

/// The outcome of one tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// The call ID this result answers.
    pub call_id: String,

    /// Whether the tool executed successfully.
    pub success: bool,

    /// Output text on success, human-readable failure text otherwise.
    pub output: String,
}

impl ToolResult {
    /// A successful result for the given call.
    pub fn ok(call_id: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            success: true,
            output: output.into(),
        }
    }

    /// A failed result whose text is reported back to the model.
    pub fn failed(call_id: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            success: false,
            output: output.into(),
        }
    }
}

/// A tool description sent to the model so it knows what it can call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,

    /// JSON Schema for the tool's arguments.
    pub parameters: serde_json::Value,
}

/// The core Tool trait.
///
/// Execution returns the output text; the registry attaches the call ID and
/// builds the [`ToolResult`].
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "get_current_weather").
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the model).
    fn description(&self) -> &str;

    /// JSON Schema describing this tool's arguments.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Execute the tool with already-validated arguments.
    async fn execute(&self, arguments: serde_json::Value) -> Result<String, ToolError>;

    /// Convert this tool into a descriptor for the model.
    fn to_descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// A read-only registry of available tools.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool. Fails if the name is already taken.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<(), ToolError> {
        let name = tool.name().to_string();
        if self.tools.contains_key(&name) {
            return Err(ToolError::Duplicate(name));
        }
        self.tools.insert(name, tool);
        Ok(())
    }

    /// Look up a tool by name.
    pub fn lookup(&self, name: &str) -> Result<&Arc<dyn Tool>, ToolError> {
        self.tools
            .get(name)
            .ok_or_else(|| ToolError::Unknown(name.to_string()))
    }

    /// All tool descriptors, for sending to the model.
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        let mut descriptors: Vec<_> = self.tools.values().map(|t| t.to_descriptor()).collect();
        // HashMap order is unstable; keep the descriptor list reproducible.
        descriptors.sort_by(|a, b| a.name.cmp(&b.name));
        descriptors
    }

    /// List all registered tool names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.tools.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Execute a tool call.
    ///
    /// Validates the arguments against the tool's schema first. Unknown
    /// tools and invalid arguments are returned as errors for the caller to
    /// absorb; an execution failure is already absorbed here into a failed
    /// [`ToolResult`] so it reaches the model as text instead of aborting
    /// the run.
    pub async fn execute(&self, call: &ToolCall) -> Result<ToolResult, ToolError> {
        let tool = self.lookup(&call.name)?;

        if let Err(reason) = validate_arguments(&call.arguments, &tool.parameters_schema()) {
            return Err(ToolError::InvalidArguments {
                tool_name: call.name.clone(),
                reason,
            });
        }

        match tool.execute(call.arguments.clone()).await {
            Ok(output) => Ok(ToolResult::ok(&call.id, output)),
            Err(e) => Ok(ToolResult::failed(&call.id, e.to_string())),
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Validate a JSON argument object against a tool's parameter schema.
///
/// Checks the subset of JSON Schema the tool descriptors use: the arguments
/// must be an object, every `required` property must be present, and
/// present properties must match a declared primitive `type`. Extra
/// properties pass through untouched.
pub fn validate_arguments(arguments: &serde_json::Value, schema: &serde_json::Value) -> Result<(), String> {
    let Some(args) = arguments.as_object() else {
        return Err("arguments must be a JSON object".into());
    };

    if let Some(required) = schema.get("required").and_then(|r| r.as_array()) {
        for field in required.iter().filter_map(|f| f.as_str()) {
            if !args.contains_key(field) {
                return Err(format!("missing required property '{field}'"));
            }
        }
    }

    let Some(properties) = schema.get("properties").and_then(|p| p.as_object()) else {
        return Ok(());
    };

    for (name, value) in args {
        let Some(expected) = properties
            .get(name)
            .and_then(|p| p.get("type"))
            .and_then(|t| t.as_str())
        else {
            continue;
        };

        let matches = match expected {
            "string" => value.is_string(),
            "number" => value.is_number(),
            "integer" => value.is_i64() || value.is_u64(),
            "boolean" => value.is_boolean(),
            "array" => value.is_array(),
            "object" => value.is_object(),
            _ => true,
        };
        if !matches {
            return Err(format!("property '{name}' must be of type {expected}"));
        }
    }

    Ok(())
}
