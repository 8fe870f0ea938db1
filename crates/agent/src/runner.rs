//! Run controller — one dispatch loop per request.
//!
//! The controller owns everything per-request: a fresh transcript, the
//! cancellation token, and the retry/deadline policy around model
//! invocations. It is consumed by `run`, so an instance can never be
//! reused across requests.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use tripsmith_config::{AppConfig, RetryConfig};
use tripsmith_core::error::{GatewayError, RunError};
use tripsmith_core::event::EventBus;
use tripsmith_core::gateway::{ModelGateway, ModelResponse};
use tripsmith_core::tool::{ToolDescriptor, ToolRegistry};
use tripsmith_core::transcript::Transcript;

use crate::orchestrator::Orchestrator;

/// A gateway decorator applying the run-level invocation policy:
/// a deadline per attempt, and bounded exponential backoff on
/// transient transport failures. A deadline miss is never retried.
pub struct RetryingGateway {
    inner: Arc<dyn ModelGateway>,
    retry: RetryConfig,
    deadline: Duration,
}

impl RetryingGateway {
    pub fn new(inner: Arc<dyn ModelGateway>, retry: RetryConfig, deadline: Duration) -> Self {
        Self {
            inner,
            retry,
            deadline,
        }
    }
}

#[async_trait]
impl ModelGateway for RetryingGateway {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn complete(
        &self,
        transcript: &Transcript,
        tools: &[ToolDescriptor],
    ) -> Result<ModelResponse, GatewayError> {
        let mut last_error = GatewayError::Unavailable {
            reason: "no attempts made".into(),
        };

        for attempt in 0..self.retry.max_attempts {
            if attempt > 0 {
                let delay = self.retry.delay_for_attempt(attempt - 1);
                warn!(
                    gateway = %self.inner.name(),
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    "Retrying model invocation"
                );
                tokio::time::sleep(delay).await;
            }

            match tokio::time::timeout(self.deadline, self.inner.complete(transcript, tools)).await
            {
                Ok(Ok(response)) => return Ok(response),
                Ok(Err(e @ GatewayError::Timeout { .. })) => return Err(e),
                Ok(Err(GatewayError::Unavailable { reason })) => {
                    warn!(
                        gateway = %self.inner.name(),
                        attempt = attempt + 1,
                        error = %reason,
                        "Model invocation failed"
                    );
                    last_error = GatewayError::Unavailable { reason };
                }
                Err(_) => {
                    return Err(GatewayError::Timeout {
                        timeout_secs: self.deadline.as_secs(),
                    });
                }
            }
        }

        Err(last_error)
    }
}

/// Controls one end-to-end run.
pub struct RunController {
    gateway: Arc<dyn ModelGateway>,
    tools: Arc<ToolRegistry>,
    config: AppConfig,
    events: Arc<EventBus>,
    cancel: CancellationToken,
    run_id: String,
}

impl RunController {
    /// Create a controller for a single request.
    pub fn new(gateway: Arc<dyn ModelGateway>, tools: Arc<ToolRegistry>, config: AppConfig) -> Self {
        Self {
            gateway,
            tools,
            config,
            events: Arc::new(EventBus::default()),
            cancel: CancellationToken::new(),
            run_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    /// Publish run events on the given bus.
    pub fn with_events(mut self, events: Arc<EventBus>) -> Self {
        self.events = events;
        self
    }

    /// This run's ID, as used in events and logs.
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// A token that cancels this run when triggered.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Execute the run to completion.
    ///
    /// Consumes the controller: the transcript is fresh, and nothing of
    /// this request survives for the next one.
    pub async fn run(self, user_message: impl Into<String>) -> Result<String, RunError> {
        let gateway = Arc::new(RetryingGateway::new(
            self.gateway,
            self.config.retry.clone(),
            self.config.run.model_timeout(),
        ));

        Orchestrator::new(gateway, self.tools, self.config.run.clone())
            .with_events(self.events)
            .with_cancellation(self.cancel)
            .with_run_id(self.run_id)
            .run(user_message)
            .await
    }
}
