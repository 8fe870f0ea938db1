//! The dispatch loop implementation.
//!
//! A four-state machine drives each run:
//!
//! - `AwaitingModel`: the transcript is sent to the gateway.
//! - `ExecutingTools`: the requested calls run, possibly concurrently;
//!   all results are appended before the model is asked again.
//! - `Done`: the model returned a final answer.
//! - `Failed`: gateway failure, iteration ceiling, or cancellation.
//!
//! Individual tool failures never reach `Failed` — they become failed
//! tool results the model can react to.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures::future::join_all;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use tripsmith_config::RunConfig;
use tripsmith_core::error::{RunError, RunFailure, ToolError};
use tripsmith_core::event::{EventBus, RunEvent};
use tripsmith_core::gateway::{ModelGateway, ModelResponse};
use tripsmith_core::tool::{ToolCall, ToolDescriptor, ToolRegistry, ToolResult};
use tripsmith_core::transcript::{Message, Transcript};

/// The states of the dispatch loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    AwaitingModel,
    ExecutingTools,
    Done,
    Failed,
}

/// The dispatch loop for one run.
///
/// Owns the transcript for the duration of the run; the registry and
/// gateway are shared, read-only collaborators.
pub struct Orchestrator {
    gateway: Arc<dyn ModelGateway>,
    tools: Arc<ToolRegistry>,
    config: RunConfig,
    events: Arc<EventBus>,
    cancel: CancellationToken,
    run_id: String,
}

impl Orchestrator {
    /// Create a new dispatch loop.
    pub fn new(gateway: Arc<dyn ModelGateway>, tools: Arc<ToolRegistry>, config: RunConfig) -> Self {
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

    /// Use an externally owned cancellation token.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Tag events and logs with the given run ID.
    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = run_id.into();
        self
    }

    /// Drive the loop from a seeded transcript to a terminal state.
    ///
    /// Consumes the orchestrator: one instance, one run.
    pub async fn run(self, user_message: impl Into<String>) -> Result<String, RunError> {
        let mut transcript = Transcript::seeded(user_message);
        let descriptors = self.tools.descriptors();
        let mut iteration: u32 = 0;

        info!(
            run_id = %self.run_id,
            gateway = %self.gateway.name(),
            tools = descriptors.len(),
            "Starting run"
        );

        loop {
            iteration += 1;
            debug!(
                run_id = %self.run_id,
                iteration,
                phase = ?RunPhase::AwaitingModel,
                transcript_len = transcript.len(),
                "Invoking model"
            );

            let response = match self.invoke_model(&transcript, &descriptors).await {
                Ok(response) => response,
                Err(failure) => return Err(self.fail(failure, transcript)),
            };

            self.events.publish(RunEvent::ModelInvoked {
                run_id: self.run_id.clone(),
                iteration,
                timestamp: Utc::now(),
            });

            let calls = match response {
                ModelResponse::Final(text) => {
                    transcript.push(Message::assistant(text.clone()));
                    debug!(run_id = %self.run_id, iteration, phase = ?RunPhase::Done, "Run complete");
                    self.events.publish(RunEvent::RunCompleted {
                        run_id: self.run_id.clone(),
                        iterations: iteration,
                        timestamp: Utc::now(),
                    });
                    return Ok(text);
                }
                ModelResponse::ToolRequests(calls) => calls,
            };

            transcript.push(Message::tool_request(calls.clone()));

            if iteration >= self.config.max_iterations {
                // The ceiling bounds model invocations; executing this
                // turn's calls would be work the model never sees.
                return Err(self.fail(
                    RunFailure::MaxIterationsExceeded {
                        limit: self.config.max_iterations,
                    },
                    transcript,
                ));
            }

            debug!(
                run_id = %self.run_id,
                iteration,
                phase = ?RunPhase::ExecutingTools,
                calls = calls.len(),
                "Executing tool calls"
            );

            match self.execute_turn(&calls).await {
                Ok(results) => transcript.push(Message::tool_results(results)),
                Err(failure) => return Err(self.fail(failure, transcript)),
            }
        }
    }

    /// One model invocation, racing the cancellation token.
    async fn invoke_model(
        &self,
        transcript: &Transcript,
        descriptors: &[ToolDescriptor],
    ) -> Result<ModelResponse, RunFailure> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(RunFailure::Cancelled),
            response = self.gateway.complete(transcript, descriptors) => {
                response.map_err(RunFailure::Gateway)
            }
        }
    }

    /// Execute one turn's calls and collect results in request order.
    ///
    /// Calls run concurrently in chunks of `max_concurrent_tool_calls`;
    /// `join_all` preserves the original call order within each chunk.
    /// Cancellation discards the whole turn — results computed before the
    /// signal are dropped, never appended, so a turn's results land
    /// all-or-none.
    async fn execute_turn(&self, calls: &[ToolCall]) -> Result<Vec<ToolResult>, RunFailure> {
        let concurrency = self.config.max_concurrent_tool_calls.max(1);
        let mut results = Vec::with_capacity(calls.len());

        for chunk in calls.chunks(concurrency) {
            let futures = chunk.iter().map(|call| self.execute_call(call));
            let chunk_results = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(RunFailure::Cancelled),
                chunk_results = join_all(futures) => chunk_results,
            };
            results.extend(chunk_results);
        }

        Ok(results)
    }

    /// Execute a single call. Never fails the run: unknown tools, invalid
    /// arguments, execution errors, and per-tool timeouts all surface as a
    /// failed result the model can adapt to.
    async fn execute_call(&self, call: &ToolCall) -> ToolResult {
        let start = Instant::now();
        let outcome =
            tokio::time::timeout(self.config.per_tool_timeout(), self.tools.execute(call)).await;

        let result = match outcome {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                warn!(run_id = %self.run_id, tool = %call.name, error = %e, "Tool call rejected");
                ToolResult::failed(&call.id, e.to_string())
            }
            Err(_) => {
                let timeout = ToolError::Timeout {
                    tool_name: call.name.clone(),
                    timeout_secs: self.config.per_tool_timeout_secs,
                };
                warn!(run_id = %self.run_id, tool = %call.name, "Tool call timed out");
                ToolResult::failed(&call.id, timeout.to_string())
            }
        };

        self.events.publish(RunEvent::ToolExecuted {
            run_id: self.run_id.clone(),
            tool_name: call.name.clone(),
            success: result.success,
            duration_ms: start.elapsed().as_millis() as u64,
            timestamp: Utc::now(),
        });

        result
    }

    /// Transition to `Failed`, surfacing the transcript for diagnostics.
    fn fail(&self, failure: RunFailure, transcript: Transcript) -> RunError {
        warn!(
            run_id = %self.run_id,
            phase = ?RunPhase::Failed,
            kind = failure.kind(),
            error = %failure,
            "Run failed"
        );
        self.events.publish(RunEvent::RunFailed {
            run_id: self.run_id.clone(),
            kind: failure.kind().to_string(),
            timestamp: Utc::now(),
        });
        RunError::new(failure, transcript)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{tool_call, EchoTool, ScriptedGateway, SleepyTool};
    use tripsmith_core::error::GatewayError;
    use tripsmith_core::transcript::MessageBody;

    fn registry() -> Arc<ToolRegistry> {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool)).unwrap();
        registry
            .register(Arc::new(SleepyTool::new("slow_echo", 50)))
            .unwrap();
        Arc::new(registry)
    }

    fn config() -> RunConfig {
        RunConfig {
            max_iterations: 10,
            per_tool_timeout_secs: 5,
            model_timeout_secs: 5,
            max_concurrent_tool_calls: 4,
        }
    }

    #[tokio::test]
    async fn final_answer_without_tools() {
        let gateway = Arc::new(ScriptedGateway::finals(&["Pack light."]));
        let orchestrator = Orchestrator::new(gateway.clone(), registry(), config());

        let answer = orchestrator.run("any tips?").await.unwrap();
        assert_eq!(answer, "Pack light.");
        assert_eq!(gateway.calls(), 1);
    }

    #[tokio::test]
    async fn tool_turn_then_final() {
        let gateway = Arc::new(ScriptedGateway::new(vec![
            ModelResponse::ToolRequests(vec![tool_call("c1", "echo", "louvre")]),
            ModelResponse::Final("Go see the Louvre.".into()),
        ]));
        let orchestrator = Orchestrator::new(gateway.clone(), registry(), config());

        let answer = orchestrator.run("paris?").await.unwrap();
        assert_eq!(answer, "Go see the Louvre.");
        assert_eq!(gateway.calls(), 2);
    }

    #[tokio::test]
    async fn results_keep_request_order_under_concurrency() {
        // The first call sleeps; the second completes immediately. The
        // appended results must still follow request order.
        let gateway = Arc::new(ScriptedGateway::new(vec![
            ModelResponse::ToolRequests(vec![
                tool_call("c1", "slow_echo", "first"),
                tool_call("c2", "echo", "second"),
            ]),
            ModelResponse::Final("done".into()),
        ]));
        let orchestrator = Orchestrator::new(gateway.clone(), registry(), config());

        orchestrator.run("order test").await.unwrap();

        let transcript = gateway.last_transcript();
        let results = transcript
            .messages()
            .iter()
            .find_map(|m| match &m.body {
                MessageBody::ToolResults { results } => Some(results.clone()),
                _ => None,
            })
            .expect("tool results message");
        assert_eq!(results[0].call_id, "c1");
        assert_eq!(results[1].call_id, "c2");
    }

    #[tokio::test]
    async fn unknown_tool_keeps_the_loop_alive() {
        let gateway = Arc::new(ScriptedGateway::new(vec![
            ModelResponse::ToolRequests(vec![tool_call("c1", "teleport", "mars")]),
            ModelResponse::Final("Sorry, no teleport.".into()),
        ]));
        let orchestrator = Orchestrator::new(gateway.clone(), registry(), config());

        let answer = orchestrator.run("beam me up").await.unwrap();
        assert_eq!(answer, "Sorry, no teleport.");
        assert_eq!(gateway.calls(), 2);

        let transcript = gateway.last_transcript();
        let results = transcript
            .messages()
            .iter()
            .find_map(|m| match &m.body {
                MessageBody::ToolResults { results } => Some(results.clone()),
                _ => None,
            })
            .unwrap();
        assert!(!results[0].success);
        assert!(results[0].output.contains("teleport"));
    }

    #[tokio::test]
    async fn per_tool_deadline_becomes_failed_result() {
        let gateway = Arc::new(ScriptedGateway::new(vec![
            ModelResponse::ToolRequests(vec![tool_call("c1", "slow_echo", "late")]),
            ModelResponse::Final("carried on".into()),
        ]));
        let mut registry = ToolRegistry::new();
        registry
            .register(Arc::new(SleepyTool::new("slow_echo", 5_000)))
            .unwrap();
        let mut cfg = config();
        cfg.per_tool_timeout_secs = 1;
        let orchestrator = Orchestrator::new(gateway.clone(), Arc::new(registry), cfg);

        let answer = orchestrator.run("slow tool").await.unwrap();
        assert_eq!(answer, "carried on");

        let transcript = gateway.last_transcript();
        let results = transcript
            .messages()
            .iter()
            .find_map(|m| match &m.body {
                MessageBody::ToolResults { results } => Some(results.clone()),
                _ => None,
            })
            .unwrap();
        assert!(!results[0].success);
        assert!(results[0].output.contains("timed out"));
    }

    #[tokio::test]
    async fn ceiling_fails_at_exact_iteration_count() {
        let gateway = Arc::new(ScriptedGateway::always_tools("echo"));
        let mut cfg = config();
        cfg.max_iterations = 3;
        let orchestrator = Orchestrator::new(gateway.clone(), registry(), cfg);

        let err = orchestrator.run("loop forever").await.unwrap_err();
        assert_eq!(err.kind(), "max_iterations_exceeded");
        assert_eq!(gateway.calls(), 3);
    }

    #[tokio::test]
    async fn gateway_failure_is_fatal_with_transcript() {
        let gateway = Arc::new(ScriptedGateway::new(vec![
            ModelResponse::ToolRequests(vec![tool_call("c1", "echo", "hi")]),
        ]));
        gateway.fail_after(1, GatewayError::Unavailable {
            reason: "boom".into(),
        });
        let orchestrator = Orchestrator::new(gateway, registry(), config());

        let err = orchestrator.run("hello").await.unwrap_err();
        assert_eq!(err.kind(), "gateway_unavailable");
        // user + request + results: the transcript survives for diagnostics.
        assert_eq!(err.transcript.len(), 3);
    }

    #[tokio::test]
    async fn cancellation_discards_partial_results() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool)).unwrap();
        registry
            .register(Arc::new(SleepyTool::new("slow_echo", 5_000)))
            .unwrap();

        let gateway = Arc::new(ScriptedGateway::new(vec![ModelResponse::ToolRequests(
            vec![
                tool_call("c1", "echo", "instant"),
                tool_call("c2", "slow_echo", "stuck"),
            ],
        )]));
        let cancel = CancellationToken::new();
        let orchestrator = Orchestrator::new(gateway, Arc::new(registry), config())
            .with_cancellation(cancel.clone());

        let cancel_trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            cancel_trigger.cancel();
        });

        let err = orchestrator.run("cancel me").await.unwrap_err();
        assert_eq!(err.kind(), "cancelled");
        // user + request only: the finished echo result was discarded.
        assert_eq!(err.transcript.len(), 2);
        assert!(err
            .transcript
            .messages()
            .iter()
            .all(|m| !matches!(m.body, MessageBody::ToolResults { .. })));
    }
}
