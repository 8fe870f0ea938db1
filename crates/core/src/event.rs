//! Run event system — decoupled observation of in-flight runs.
//!
//! Events are published as a run progresses so callers can watch without
//! coupling to the loop internals.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Everything observable about one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RunEvent {
    /// The model was invoked.
    ModelInvoked {
        run_id: String,
        iteration: u32,
        timestamp: DateTime<Utc>,
    },

    /// A tool call finished executing.
    ToolExecuted {
        run_id: String,
        tool_name: String,
        success: bool,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// The run produced a final answer.
    RunCompleted {
        run_id: String,
        iterations: u32,
        timestamp: DateTime<Utc>,
    },

    /// The run terminated in failure.
    RunFailed {
        run_id: String,
        kind: String,
        timestamp: DateTime<Utc>,
    },
}

/// A broadcast-based bus for run events.
pub struct EventBus {
    sender: broadcast::Sender<Arc<RunEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: RunEvent) {
        // No subscribers is fine.
        let _ = self.sender.send(Arc::new(event));
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<RunEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
