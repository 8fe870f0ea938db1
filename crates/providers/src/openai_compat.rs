//! OpenAI-compatible gateway implementation.
//!
//! Works with any endpoint exposing a `/chat/completions` route: OpenAI,
//! OpenRouter, Ollama, vLLM, Together AI. A response carrying tool calls
//! becomes `ToolRequests`; anything else becomes `Final`.
//!
//! The client applies no retry policy of its own — retries and deadlines
//! belong to the run controller.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use tripsmith_core::error::GatewayError;
use tripsmith_core::gateway::{ModelGateway, ModelResponse};
use tripsmith_core::tool::{ToolCall, ToolDescriptor};
use tripsmith_core::transcript::{MessageBody, Transcript};

/// An OpenAI-compatible completion gateway.
pub struct OpenAiCompatGateway {
    name: String,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    client: reqwest::Client,
}

impl OpenAiCompatGateway {
    /// Create a new OpenAI-compatible gateway.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            temperature: 0.7,
            max_tokens: None,
            client,
        }
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the max tokens per response.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Convert the transcript to the wire message format.
    ///
    /// A tool-results message fans out to one wire message per result,
    /// since the chat API expects a separate `tool` message per call ID.
    fn to_api_messages(transcript: &Transcript) -> Vec<ApiMessage> {
        let mut api_messages = Vec::with_capacity(transcript.len());
        for message in transcript.messages() {
            match &message.body {
                MessageBody::User { content } => api_messages.push(ApiMessage {
                    role: "user".into(),
                    content: Some(content.clone()),
                    tool_calls: None,
                    tool_call_id: None,
                }),
                MessageBody::Assistant { content } => api_messages.push(ApiMessage {
                    role: "assistant".into(),
                    content: Some(content.clone()),
                    tool_calls: None,
                    tool_call_id: None,
                }),
                MessageBody::ToolRequest { calls } => api_messages.push(ApiMessage {
                    role: "assistant".into(),
                    content: None,
                    tool_calls: Some(
                        calls
                            .iter()
                            .map(|c| ApiToolCall {
                                id: c.id.clone(),
                                r#type: "function".into(),
                                function: ApiFunction {
                                    name: c.name.clone(),
                                    arguments: c.arguments.to_string(),
                                },
                            })
                            .collect(),
                    ),
                    tool_call_id: None,
                }),
                MessageBody::ToolResults { results } => {
                    for result in results {
                        api_messages.push(ApiMessage {
                            role: "tool".into(),
                            content: Some(result.output.clone()),
                            tool_calls: None,
                            tool_call_id: Some(result.call_id.clone()),
                        });
                    }
                }
            }
        }
        api_messages
    }

    /// Convert tool descriptors to the wire format.
    fn to_api_tools(tools: &[ToolDescriptor]) -> Vec<ApiToolDefinition> {
        tools
            .iter()
            .map(|t| ApiToolDefinition {
                r#type: "function".into(),
                function: ApiToolFunction {
                    name: t.name.clone(),
                    description: t.description.clone(),
                    parameters: t.parameters.clone(),
                },
            })
            .collect()
    }
}

#[async_trait]
impl ModelGateway for OpenAiCompatGateway {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        transcript: &Transcript,
        tools: &[ToolDescriptor],
    ) -> Result<ModelResponse, GatewayError> {
        let url = format!("{}/chat/completions", self.base_url);

        let mut body = serde_json::json!({
            "model": self.model,
            "messages": Self::to_api_messages(transcript),
            "temperature": self.temperature,
            "stream": false,
        });

        if let Some(max_tokens) = self.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }

        if !tools.is_empty() {
            body["tools"] = serde_json::json!(Self::to_api_tools(tools));
        }

        debug!(gateway = %self.name, model = %self.model, "Sending completion request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::Unavailable {
                reason: format!("transport error: {e}"),
            })?;

        let status = response.status().as_u16();
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Gateway returned error");
            return Err(GatewayError::Unavailable {
                reason: format!("status {status}: {error_body}"),
            });
        }

        let api_response: ApiResponse =
            response.json().await.map_err(|e| GatewayError::Unavailable {
                reason: format!("failed to parse response: {e}"),
            })?;

        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| GatewayError::Unavailable {
                reason: "no choices in response".into(),
            })?;

        let tool_calls = choice.message.tool_calls.unwrap_or_default();
        if tool_calls.is_empty() {
            return Ok(ModelResponse::Final(
                choice.message.content.unwrap_or_default(),
            ));
        }

        let calls = tool_calls
            .into_iter()
            .map(|tc| ToolCall {
                id: tc.id,
                name: tc.function.name,
                // An unparseable argument string is kept raw; schema
                // validation turns it into a model-visible failure.
                arguments: serde_json::from_str(&tc.function.arguments)
                    .unwrap_or(serde_json::Value::String(tc.function.arguments)),
            })
            .collect();

        Ok(ModelResponse::ToolRequests(calls))
    }
}

// ── Wire format ──────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ApiMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<ApiToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiToolCall {
    id: String,
    r#type: String,
    function: ApiFunction,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiFunction {
    name: String,
    arguments: String,
}

#[derive(Debug, Serialize)]
struct ApiToolDefinition {
    r#type: String,
    function: ApiToolFunction,
}

#[derive(Debug, Serialize)]
struct ApiToolFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    choices: Vec<ApiChoice>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ApiResponseMessage {
    content: Option<String>,
    tool_calls: Option<Vec<ApiToolCall>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tripsmith_core::tool::ToolResult;
    use tripsmith_core::transcript::Message;

    #[test]
    fn transcript_maps_to_wire_roles() {
        let mut transcript = Transcript::seeded("3-day trip to Paris");
        transcript.push(Message::tool_request(vec![ToolCall {
            id: "call_1".into(),
            name: "search_attractions".into(),
            arguments: serde_json::json!({"city": "Paris"}),
        }]));
        transcript.push(Message::tool_results(vec![ToolResult::ok(
            "call_1",
            "Louvre, Eiffel Tower",
        )]));
        transcript.push(Message::assistant("Here is your plan."));

        let api = OpenAiCompatGateway::to_api_messages(&transcript);
        let roles: Vec<_> = api.iter().map(|m| m.role.as_str()).collect();
        assert_eq!(roles, vec!["user", "assistant", "tool", "assistant"]);
        assert_eq!(api[2].tool_call_id.as_deref(), Some("call_1"));
        assert!(api[1].tool_calls.is_some());
        assert!(api[1].content.is_none());
    }

    #[test]
    fn descriptors_map_to_function_tools() {
        let tools = vec![ToolDescriptor {
            name: "convert_currency".into(),
            description: "Convert between currencies".into(),
            parameters: serde_json::json!({"type": "object"}),
        }];
        let api = OpenAiCompatGateway::to_api_tools(&tools);
        assert_eq!(api.len(), 1);
        assert_eq!(api[0].r#type, "function");
        assert_eq!(api[0].function.name, "convert_currency");
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let gateway =
            OpenAiCompatGateway::new("test", "http://localhost:8080/v1/", "key", "test-model");
        assert_eq!(gateway.base_url, "http://localhost:8080/v1");
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_unavailable() {
        // Port 9 (discard) is not listening; the request fails at transport.
        let gateway = OpenAiCompatGateway::new(
            "test",
            "http://127.0.0.1:9/v1",
            "key",
            "test-model",
        );
        let transcript = Transcript::seeded("hello");
        let err = gateway.complete(&transcript, &[]).await.unwrap_err();
        assert!(matches!(err, GatewayError::Unavailable { .. }));
    }
}
