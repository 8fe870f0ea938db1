//! Error types for the Tripsmith domain.
//!
//! Uses `thiserror` for ergonomic error definitions. Each bounded context
//! has its own enum; `RunError` is the terminal error surfaced to callers
//! and carries the transcript accumulated so far for diagnostics.

use thiserror::Error;

use crate::transcript::Transcript;

/// Errors from the model gateway boundary.
///
/// Transport and auth failures are collapsed into `Unavailable`; the
/// original detail is preserved in the reason text.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("Model gateway unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Model gateway timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },
}

/// Errors from the tool registry and tool execution.
#[derive(Debug, Clone, Error)]
pub enum ToolError {
    #[error("Tool already registered: {0}")]
    Duplicate(String),

    #[error("Unknown tool: {0}")]
    Unknown(String),

    #[error("Invalid arguments for tool '{tool_name}': {reason}")]
    InvalidArguments { tool_name: String, reason: String },

    #[error("Tool execution failed: {tool_name} — {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Tool timed out: {tool_name} after {timeout_secs}s")]
    Timeout { tool_name: String, timeout_secs: u64 },
}

/// The reason a run terminated in failure.
///
/// Individual tool failures never appear here — they are absorbed into
/// failed tool results so the model can adapt.
#[derive(Debug, Clone, Error)]
pub enum RunFailure {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("Exceeded maximum of {limit} model invocations")]
    MaxIterationsExceeded { limit: u32 },

    #[error("Run was cancelled")]
    Cancelled,
}

impl RunFailure {
    /// A stable machine-readable kind for the failed subsystem.
    pub fn kind(&self) -> &'static str {
        match self {
            RunFailure::Gateway(GatewayError::Unavailable { .. }) => "gateway_unavailable",
            RunFailure::Gateway(GatewayError::Timeout { .. }) => "gateway_timeout",
            RunFailure::MaxIterationsExceeded { .. } => "max_iterations_exceeded",
            RunFailure::Cancelled => "cancelled",
        }
    }
}

/// The terminal error for one run.
#[derive(Debug, Clone, Error)]
#[error("{failure}")]
pub struct RunError {
    /// What went wrong.
    pub failure: RunFailure,

    /// The transcript accumulated up to the point of failure.
    pub transcript: Transcript,
}

impl RunError {
    pub fn new(failure: impl Into<RunFailure>, transcript: Transcript) -> Self {
        Self {
            failure: failure.into(),
            transcript,
        }
    }

    /// A stable machine-readable kind for the failed subsystem.
    pub fn kind(&self) -> &'static str {
        self.failure.kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gateway_error_displays_reason() {
        let err = GatewayError::Unavailable {
            reason: "connection refused".into(),
        };
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn tool_error_displays_tool_name() {
        let err = ToolError::InvalidArguments {
            tool_name: "convert_currency".into(),
            reason: "missing required property 'amount'".into(),
        };
        assert!(err.to_string().contains("convert_currency"));
        assert!(err.to_string().contains("amount"));
    }

    #[test]
    fn run_error_kind_is_stable() {
        let err = RunError::new(
            RunFailure::MaxIterationsExceeded { limit: 10 },
            Transcript::new(),
        );
        assert_eq!(err.kind(), "max_iterations_exceeded");
        assert!(err.to_string().contains("10"));

        let err = RunError::new(
            GatewayError::Timeout { timeout_secs: 30 },
            Transcript::new(),
        );
        assert_eq!(err.kind(), "gateway_timeout");
    }
}
