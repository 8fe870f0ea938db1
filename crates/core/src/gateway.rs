//! ModelGateway trait — the abstraction over completion providers.
//!
//! A gateway sends the transcript plus the registry's tool descriptors to a
//! completion provider and returns either a final textual answer or a set
//! of requested tool invocations — never both. The gateway is stateless
//! across calls: all context travels in the transcript argument.

use async_trait::async_trait;

use crate::error::GatewayError;
use crate::tool::{ToolCall, ToolDescriptor};
use crate::transcript::Transcript;

/// What the model decided to do with the transcript so far.
#[derive(Debug, Clone)]
pub enum ModelResponse {
    /// A final textual answer; the run terminates with this text.
    Final(String),

    /// Tool invocations to execute before asking the model again.
    ToolRequests(Vec<ToolCall>),
}

/// The boundary to a completion provider.
///
/// Implementations: the OpenAI-compatible HTTP client, scripted mocks in
/// tests. Implementations must be safe to retry on transport failure —
/// retry policy belongs to the run controller, not to the gateway.
#[async_trait]
pub trait ModelGateway: Send + Sync {
    /// A human-readable name for this gateway (e.g., "openai-compat").
    fn name(&self) -> &str;

    /// Send the transcript and available tools; get the model's decision.
    async fn complete(
        &self,
        transcript: &Transcript,
        tools: &[ToolDescriptor],
    ) -> Result<ModelResponse, GatewayError>;
}
