//! Error types for the workflow crate.
//!
//! Errors are designed for layered context using rootcause:
//! - `GraphError`: Low-level graph structure operations (nodes, edges)
//! - `StepError`: Failures raised by a step body
//! - `EngineError`: Registration, validation and run failures (wraps the above)

use std::fmt;

/// Errors from graph structure operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// Node with the given name was not added to the graph.
    NodeNotFound { node: &'static str },
    /// A second static edge was declared for a node that already has one.
    ConflictingStaticEdge {
        node: &'static str,
        existing: String,
        requested: String,
    },
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NodeNotFound { node } => write!(f, "node not found: {node}"),
            Self::ConflictingStaticEdge {
                node,
                existing,
                requested,
            } => {
                write!(
                    f,
                    "node {node} already has a static edge to {existing}, cannot add one to {requested}"
                )
            }
        }
    }
}

impl std::error::Error for GraphError {}

/// Errors raised by a step body.
///
/// Step implementations map their domain errors into one of these variants;
/// the engine attaches the node name when it propagates them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepError {
    /// The state or external input handed to the step was unusable.
    InvalidInput { message: String },
    /// An external collaborator (LLM, tracker, holiday source) failed.
    ExternalService { service: String, message: String },
    /// Continuing would leave the state self-contradictory.
    InconsistentState { message: String },
    /// Any other failure.
    ExecutionFailed { message: String },
}

impl StepError {
    /// Shorthand for an [`StepError::ExternalService`] error.
    #[must_use]
    pub fn external(service: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::ExternalService {
            service: service.into(),
            message: message.to_string(),
        }
    }

    /// Shorthand for an [`StepError::InvalidInput`] error.
    #[must_use]
    pub fn invalid_input(message: impl fmt::Display) -> Self {
        Self::InvalidInput {
            message: message.to_string(),
        }
    }
}

impl fmt::Display for StepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidInput { message } => write!(f, "invalid input: {message}"),
            Self::ExternalService { service, message } => {
                write!(f, "external service error ({service}): {message}")
            }
            Self::InconsistentState { message } => write!(f, "inconsistent state: {message}"),
            Self::ExecutionFailed { message } => write!(f, "execution failed: {message}"),
        }
    }
}

impl std::error::Error for StepError {}

/// Errors from the workflow engine.
///
/// Everything except `StepFailed` is a configuration defect in the graph
/// itself and aborts the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// A step was registered twice under the same name.
    DuplicateNode { node: &'static str },
    /// Execution reached a node with no registered step.
    UnknownNode { node: &'static str },
    /// A node without a static edge returned no routing decision.
    MissingRoutingDecision { node: &'static str },
    /// Validation found node names without a registered step.
    UnregisteredNodes { nodes: Vec<&'static str> },
    /// The run executed more steps than the configured limit.
    StepLimitExceeded { limit: usize },
    /// A step body failed.
    StepFailed {
        node: &'static str,
        source: StepError,
    },
    /// Graph structure error.
    Graph(GraphError),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateNode { node } => write!(f, "node {node} is already registered"),
            Self::UnknownNode { node } => write!(f, "no step registered for node {node}"),
            Self::MissingRoutingDecision { node } => {
                write!(f, "node {node} returned no routing decision and has no static edge")
            }
            Self::UnregisteredNodes { nodes } => {
                write!(f, "nodes without a registered step: {}", nodes.join(", "))
            }
            Self::StepLimitExceeded { limit } => {
                write!(f, "run exceeded the limit of {limit} steps")
            }
            Self::StepFailed { node, source } => write!(f, "node {node} failed: {source}"),
            Self::Graph(e) => write!(f, "graph error: {e}"),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<GraphError> for EngineError {
    fn from(e: GraphError) -> Self {
        Self::Graph(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn graph_error_display() {
        let err = GraphError::ConflictingStaticEdge {
            node: "estimate",
            existing: "router".to_string(),
            requested: "__end__".to_string(),
        };
        assert!(err.to_string().contains("already has a static edge"));
    }

    #[test]
    fn step_failure_mentions_node_and_cause() {
        let err = EngineError::StepFailed {
            node: "create_issues",
            source: StepError::external("tracker", "503"),
        };
        let message = err.to_string();
        assert!(message.contains("create_issues"));
        assert!(message.contains("tracker"));
    }

    #[test]
    fn unregistered_nodes_are_listed() {
        let err = EngineError::UnregisteredNodes {
            nodes: vec!["a", "b"],
        };
        assert!(err.to_string().ends_with("a, b"));
    }
}
