//! Shared test doubles for dispatch loop tests.

use std::sync::Mutex;

use async_trait::async_trait;

use tripsmith_core::error::{GatewayError, ToolError};
use tripsmith_core::gateway::{ModelGateway, ModelResponse};
use tripsmith_core::tool::{Tool, ToolCall, ToolDescriptor};
use tripsmith_core::transcript::Transcript;

/// Build a tool call with a single `text` argument.
pub(crate) fn tool_call(id: &str, name: &str, text: &str) -> ToolCall {
    ToolCall {
        id: id.into(),
        name: name.into(),
        arguments: serde_json::json!({ "text": text }),
    }
}

/// A gateway that returns scripted responses in sequence.
///
/// Panics if more calls are made than responses provided, unless built
/// with [`ScriptedGateway::always_tools`]. Records every transcript it is
/// handed so tests can assert on what the model saw.
pub(crate) struct ScriptedGateway {
    responses: Mutex<Vec<ModelResponse>>,
    repeat_tool: Option<String>,
    call_count: Mutex<usize>,
    last_transcript: Mutex<Option<Transcript>>,
    fail_after: Mutex<Option<(usize, GatewayError)>>,
}

impl ScriptedGateway {
    pub(crate) fn new(responses: Vec<ModelResponse>) -> Self {
        Self {
            responses: Mutex::new(responses),
            repeat_tool: None,
            call_count: Mutex::new(0),
            last_transcript: Mutex::new(None),
            fail_after: Mutex::new(None),
        }
    }

    /// A gateway returning the given final answers in sequence.
    pub(crate) fn finals(texts: &[&str]) -> Self {
        Self::new(
            texts
                .iter()
                .map(|t| ModelResponse::Final((*t).into()))
                .collect(),
        )
    }

    /// A gateway that requests the named tool on every invocation.
    pub(crate) fn always_tools(tool_name: &str) -> Self {
        let mut gateway = Self::new(Vec::new());
        gateway.repeat_tool = Some(tool_name.into());
        gateway
    }

    /// Fail with the given error once more than `n` calls have been made.
    pub(crate) fn fail_after(&self, n: usize, error: GatewayError) {
        *self.fail_after.lock().unwrap() = Some((n, error));
    }

    pub(crate) fn calls(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    /// The transcript passed to the most recent invocation.
    pub(crate) fn last_transcript(&self) -> Transcript {
        self.last_transcript
            .lock()
            .unwrap()
            .clone()
            .expect("gateway was never invoked")
    }
}

#[async_trait]
impl ModelGateway for ScriptedGateway {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(
        &self,
        transcript: &Transcript,
        _tools: &[ToolDescriptor],
    ) -> Result<ModelResponse, GatewayError> {
        *self.last_transcript.lock().unwrap() = Some(transcript.clone());
        let mut count = self.call_count.lock().unwrap();
        *count += 1;

        if let Some((n, error)) = self.fail_after.lock().unwrap().as_ref() {
            if *count > *n {
                return Err(error.clone());
            }
        }

        if let Some(tool_name) = &self.repeat_tool {
            return Ok(ModelResponse::ToolRequests(vec![tool_call(
                &format!("c{count}"),
                tool_name,
                "again",
            )]));
        }

        let responses = self.responses.lock().unwrap();
        let index = *count - 1;
        if index >= responses.len() {
            panic!(
                "ScriptedGateway exhausted: call #{count}, have {}",
                responses.len()
            );
        }
        Ok(responses[index].clone())
    }
}

/// A gateway that always fails with the given error.
pub(crate) struct FailingGateway {
    error: GatewayError,
    call_count: Mutex<usize>,
}

impl FailingGateway {
    pub(crate) fn new(error: GatewayError) -> Self {
        Self {
            error,
            call_count: Mutex::new(0),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        *self.call_count.lock().unwrap()
    }
}

#[async_trait]
impl ModelGateway for FailingGateway {
    fn name(&self) -> &str {
        "failing"
    }

    async fn complete(
        &self,
        _transcript: &Transcript,
        _tools: &[ToolDescriptor],
    ) -> Result<ModelResponse, GatewayError> {
        *self.call_count.lock().unwrap() += 1;
        Err(self.error.clone())
    }
}

/// A gateway that never responds (for deadline tests).
pub(crate) struct HangingGateway;

#[async_trait]
impl ModelGateway for HangingGateway {
    fn name(&self) -> &str {
        "hanging"
    }

    async fn complete(
        &self,
        _transcript: &Transcript,
        _tools: &[ToolDescriptor],
    ) -> Result<ModelResponse, GatewayError> {
        tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
        unreachable!()
    }
}

/// Echoes the `text` argument back.
pub(crate) struct EchoTool;

#[async_trait]
impl Tool for EchoTool {
    fn name(&self) -> &str {
        "echo"
    }
    fn description(&self) -> &str {
        "Echoes back the input"
    }
    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": { "text": { "type": "string" } },
            "required": ["text"]
        })
    }
    async fn execute(&self, arguments: serde_json::Value) -> Result<String, ToolError> {
        Ok(arguments["text"].as_str().unwrap_or_default().to_string())
    }
}

/// Echoes after a fixed delay.
pub(crate) struct SleepyTool {
    name: String,
    delay_ms: u64,
}

impl SleepyTool {
    pub(crate) fn new(name: &str, delay_ms: u64) -> Self {
        Self {
            name: name.into(),
            delay_ms,
        }
    }
}

#[async_trait]
impl Tool for SleepyTool {
    fn name(&self) -> &str {
        &self.name
    }
    fn description(&self) -> &str {
        "Echoes back the input, slowly"
    }
    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": { "text": { "type": "string" } },
            "required": ["text"]
        })
    }
    async fn execute(&self, arguments: serde_json::Value) -> Result<String, ToolError> {
        tokio::time::sleep(std::time::Duration::from_millis(self.delay_ms)).await;
        Ok(arguments["text"].as_str().unwrap_or_default().to_string())
    }
}
