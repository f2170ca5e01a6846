//! Node identifiers and routing decisions.
//!
//! A workflow's nodes are named by an enum implementing [`NodeName`]. Using a
//! closed set of identifiers (rather than strings) lets the engine check at
//! build time that every node has a step, so an unknown routing target can
//! only appear if validation was skipped.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;

/// Name reserved for the synthetic entry vertex in rendered graphs.
pub const START: &str = "__start__";

/// Name of the terminal sentinel.
pub const END: &str = "__end__";

/// The category of a workflow node, used when rendering the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeCategory {
    /// Pure passthrough that re-emits an earlier routing decision.
    Router,
    /// Local computation over the state.
    Compute,
    /// Reads input files or other local data sources.
    Ingest,
    /// Calls a language model.
    AiLayer,
    /// Calls an external service (issue tracker, holiday calendar).
    Integration,
}

/// A closed set of node identifiers.
pub trait NodeName:
    Copy + Eq + Hash + Ord + fmt::Debug + fmt::Display + Send + Sync + 'static
{
    /// Every identifier, in declaration order.
    fn all() -> &'static [Self];

    /// Stable snake_case name used in logs and rendering.
    fn as_str(&self) -> &'static str;

    /// The category of the node.
    fn category(&self) -> NodeCategory {
        NodeCategory::Compute
    }
}

/// Where execution goes after a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route<N> {
    /// Continue with the named node.
    Node(N),
    /// Stop the run.
    End,
}

impl<N: NodeName> Route<N> {
    /// Returns the node name, or the terminal sentinel name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Node(node) => node.as_str(),
            Self::End => END,
        }
    }
}

impl<N: NodeName> fmt::Display for Route<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<N> From<N> for Route<N> {
    fn from(node: N) -> Self {
        Self::Node(node)
    }
}
