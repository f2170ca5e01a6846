//! Workflow engine for sprintcraft.
//!
//! This crate provides a small state-machine executor:
//!
//! - **Nodes**: a closed enum of node identifiers ([`NodeName`]) plus the
//!   [`Route`] a node hands control to
//! - **State**: the [`GraphState`] contract; steps return partial updates
//!   and the engine merges them
//! - **Steps**: async node bodies ([`Step`]), closures ([`FnStep`]) and the
//!   passthrough [`Router`]
//! - **Graph Model**: a petgraph view of static edges and declared dynamic
//!   routes, renderable as Graphviz or Mermaid
//! - **Execution**: the [`WorkflowEngine`] loop and per-run bookkeeping

pub mod engine;
pub mod error;
pub mod execution;
pub mod graph;
pub mod node;
pub mod state;
pub mod step;

pub use engine::{DEFAULT_STEP_LIMIT, RunOutcome, WorkflowEngine};
pub use error::{EngineError, GraphError, StepError};
pub use execution::{ExecutionState, NodeVisit, VisitOutcome, WorkflowRun};
pub use graph::{EdgeKind, Vertex, WorkflowGraph};
pub use node::{END, NodeCategory, NodeName, Route, START};
pub use state::{GraphState, StateUpdate};
pub use step::{FnStep, Router, Step};
