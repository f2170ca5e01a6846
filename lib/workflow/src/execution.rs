//! Run bookkeeping.
//!
//! The engine records every node it executes, in order, so callers can see
//! the exact path a run took through the graph. Nothing here influences
//! routing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sprintcraft_core::WorkflowRunId;

/// Lifecycle of a run: queued, running, then completed or failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionState {
    Queued,
    Running,
    /// Control reached `END`.
    Completed,
    /// A step failed or the step limit was hit.
    Failed,
}

impl ExecutionState {
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// How a single node execution ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisitOutcome {
    Completed,
    Failed,
}

/// One execution of one node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeVisit {
    /// The node that ran.
    pub node: String,
    pub outcome: VisitOutcome,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Everything the engine observed while driving one state through the
/// graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowRun {
    pub id: WorkflowRunId,
    pub state: ExecutionState,
    pub queued_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    /// In execution order; a revisited node appears once per visit.
    pub visits: Vec<NodeVisit>,
    /// Rendered failure, set only when `state` is `Failed`.
    pub error: Option<String>,
}

impl WorkflowRun {
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: WorkflowRunId::new(),
            state: ExecutionState::Queued,
            queued_at: Utc::now(),
            started_at: None,
            finished_at: None,
            visits: Vec::new(),
            error: None,
        }
    }

    pub fn start(&mut self) {
        self.state = ExecutionState::Running;
        self.started_at = Some(Utc::now());
    }

    /// Records a node execution that started at `started_at` and ends now.
    pub fn record_visit(
        &mut self,
        node: &str,
        outcome: VisitOutcome,
        started_at: DateTime<Utc>,
    ) {
        self.visits.push(NodeVisit {
            node: node.to_string(),
            outcome,
            started_at,
            finished_at: Utc::now(),
        });
    }

    pub fn complete(&mut self) {
        self.state = ExecutionState::Completed;
        self.finished_at = Some(Utc::now());
    }

    pub fn fail(&mut self, error: String) {
        self.state = ExecutionState::Failed;
        self.finished_at = Some(Utc::now());
        self.error = Some(error);
    }

    /// Number of node executions so far.
    #[must_use]
    pub fn step_count(&self) -> usize {
        self.visits.len()
    }

    /// Names of the executed nodes, in order.
    #[must_use]
    pub fn path(&self) -> Vec<&str> {
        self.visits.iter().map(|visit| visit.node.as_str()).collect()
    }

    /// Wall time so far, or in total once finished. `None` before start.
    #[must_use]
    pub fn duration(&self) -> Option<chrono::Duration> {
        let start = self.started_at?;
        let end = self.finished_at.unwrap_or_else(Utc::now);
        Some(end - start)
    }
}

impl Default for WorkflowRun {
    fn default() -> Self {
        Self::new()
    }
}
