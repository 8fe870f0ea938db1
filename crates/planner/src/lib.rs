//! Caller-facing surface for Tripsmith.
//!
//! One entry point: build a [`TripPlanner`] with a gateway, a tool
//! registry, and validated configuration, then call [`TripPlanner::plan`]
//! with a [`TripRequest`]. Each call gets its own run controller and a
//! fresh transcript — nothing is shared between requests except the
//! read-only registry and the gateway client.

pub mod request;

use std::sync::Arc;

use tracing::info;

use tripsmith_agent::RunController;
use tripsmith_config::AppConfig;
use tripsmith_core::error::{RunError, ToolError};
use tripsmith_core::event::EventBus;
use tripsmith_core::gateway::ModelGateway;
use tripsmith_core::tool::ToolRegistry;

pub use request::{BudgetTier, TripRequest};

/// The trip-planning assistant.
pub struct TripPlanner {
    gateway: Arc<dyn ModelGateway>,
    tools: Arc<ToolRegistry>,
    config: AppConfig,
    events: Arc<EventBus>,
}

impl TripPlanner {
    /// Create a planner over an explicit tool registry.
    pub fn new(gateway: Arc<dyn ModelGateway>, tools: Arc<ToolRegistry>, config: AppConfig) -> Self {
        Self {
            gateway,
            tools,
            config,
            events: Arc::new(EventBus::default()),
        }
    }

    /// Create a planner wired to the built-in trip tools.
    pub fn with_builtin_tools(
        gateway: Arc<dyn ModelGateway>,
        config: AppConfig,
    ) -> Result<Self, ToolError> {
        let tools = Arc::new(tripsmith_tools::default_registry()?);
        Ok(Self::new(gateway, tools, config))
    }

    /// Publish run events on the given bus.
    pub fn with_events(mut self, events: Arc<EventBus>) -> Self {
        self.events = events;
        self
    }

    /// A fresh run controller for one request.
    ///
    /// Use this instead of [`TripPlanner::plan`] when the caller needs the
    /// cancellation token or the run ID before starting.
    pub fn run_controller(&self) -> RunController {
        RunController::new(
            self.gateway.clone(),
            self.tools.clone(),
            self.config.clone(),
        )
        .with_events(self.events.clone())
    }

    /// Plan one trip: returns the final plan text, or a typed error
    /// carrying the failure kind and the transcript so far.
    pub async fn plan(&self, request: &TripRequest) -> Result<String, RunError> {
        let controller = self.run_controller();
        info!(
            run_id = %controller.run_id(),
            destination = request.destination.as_deref().unwrap_or("unspecified"),
            "Planning trip"
        );
        controller.run(request.seed_message()).await
    }
}
