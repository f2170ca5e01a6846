//! The workflow engine.
//!
//! Drives a run from a start node to the terminal sentinel:
//! 1. Look up the current node's step
//! 2. Run it against a shared borrow of the state
//! 3. Merge the returned update into the state
//! 4. Follow the node's static edge, or else the routing decision the update
//!    carried
//!
//! Exactly one step runs at a time. The engine owns the state for the whole
//! run, never retries a failed step, and never memoizes: a node reached twice
//! runs twice.

use crate::error::{EngineError, StepError};
use crate::execution::{VisitOutcome, WorkflowRun};
use crate::graph::WorkflowGraph;
use crate::node::{NodeName, Route};
use crate::state::{GraphState, StateUpdate};
use crate::step::{FnStep, Step};
use chrono::Utc;
use std::collections::HashMap;
use tracing::{debug, error, info, instrument};

/// Default upper bound on node executions per run.
pub const DEFAULT_STEP_LIMIT: usize = 100;

/// The final state of a successful run and its bookkeeping.
#[derive(Debug)]
pub struct RunOutcome<S> {
    pub state: S,
    pub run: WorkflowRun,
}

/// A registry of steps plus the graph structure connecting them.
pub struct WorkflowEngine<S: GraphState> {
    steps: HashMap<S::Node, Box<dyn Step<S>>>,
    graph: WorkflowGraph<S::Node>,
    step_limit: usize,
}

impl<S: GraphState> WorkflowEngine<S> {
    /// Creates an engine with no registered steps.
    #[must_use]
    pub fn new() -> Self {
        Self {
            steps: HashMap::new(),
            graph: WorkflowGraph::new(),
            step_limit: DEFAULT_STEP_LIMIT,
        }
    }

    /// Sets the maximum number of node executions per run.
    #[must_use]
    pub fn with_step_limit(mut self, limit: usize) -> Self {
        self.step_limit = limit;
        self
    }

    /// Registers the step for a node.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateNode` if the node already has a step.
    pub fn register(
        &mut self,
        node: S::Node,
        step: impl Step<S> + 'static,
    ) -> Result<(), EngineError> {
        if self.steps.contains_key(&node) {
            return Err(EngineError::DuplicateNode {
                node: node.as_str(),
            });
        }
        self.graph.add_node(node);
        self.steps.insert(node, Box::new(step));
        Ok(())
    }

    /// Registers a synchronous closure as the step for a node.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateNode` if the node already has a step.
    pub fn register_fn<F>(&mut self, node: S::Node, f: F) -> Result<(), EngineError>
    where
        F: Fn(&S) -> Result<S::Update, StepError> + Send + Sync + 'static,
    {
        self.register(node, FnStep(f))
    }

    /// Declares an unconditional transition.
    ///
    /// Only for nodes with exactly one possible successor.
    ///
    /// # Errors
    ///
    /// Returns an error if `from` (or a node-valued `to`) has no registered
    /// step, or if `from` already has a different static edge.
    pub fn add_static_edge(
        &mut self,
        from: S::Node,
        to: impl Into<Route<S::Node>>,
    ) -> Result<(), EngineError> {
        self.graph.add_static_edge(from, to.into())?;
        Ok(())
    }

    /// Records the targets a dynamically routed node may choose.
    ///
    /// Used for rendering only; routing at run time is not restricted to
    /// these targets.
    ///
    /// # Errors
    ///
    /// Returns an error if any endpoint has no registered step.
    pub fn declare_routes(
        &mut self,
        from: S::Node,
        targets: &[Route<S::Node>],
    ) -> Result<(), EngineError> {
        for target in targets {
            self.graph.add_dynamic_route(from, *target)?;
        }
        Ok(())
    }

    /// Marks the entry node in the rendered graph.
    ///
    /// # Errors
    ///
    /// Returns an error if the node has no registered step.
    pub fn set_entry(&mut self, node: S::Node) -> Result<(), EngineError> {
        self.graph.set_entry(node)?;
        Ok(())
    }

    /// Checks that every node identifier has a registered step.
    ///
    /// # Errors
    ///
    /// Returns `UnregisteredNodes` listing every identifier without a step.
    pub fn validate(&self) -> Result<(), EngineError> {
        let missing: Vec<&'static str> = S::Node::all()
            .iter()
            .filter(|node| !self.steps.contains_key(*node))
            .map(NodeName::as_str)
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(EngineError::UnregisteredNodes { nodes: missing })
        }
    }

    /// Returns the graph structure.
    #[must_use]
    pub fn graph(&self) -> &WorkflowGraph<S::Node> {
        &self.graph
    }

    /// Runs the graph from `start` until the terminal sentinel.
    ///
    /// # Errors
    ///
    /// Returns an error if a node has no step, a dynamically routed node
    /// returns no routing decision, the step limit is exceeded, or a step
    /// fails. The partially updated state is dropped.
    #[instrument(skip(self, initial), fields(run_id = tracing::field::Empty))]
    pub async fn run(&self, initial: S, start: S::Node) -> Result<RunOutcome<S>, EngineError> {
        let mut run = WorkflowRun::new();
        tracing::Span::current().record("run_id", tracing::field::display(run.id));
        run.start();
        info!(start = %start, "workflow run started");

        let mut state = initial;
        let mut current = start;

        loop {
            match self.execute(&mut state, &mut run, current).await {
                Ok(Route::Node(next)) => current = next,
                Ok(Route::End) => break,
                Err(e) => {
                    error!(node = %current, error = %e, "workflow run failed");
                    run.fail(e.to_string());
                    return Err(e);
                }
            }
        }

        run.complete();
        info!(
            steps = run.step_count(),
            duration_ms = run.duration().map(|d| d.num_milliseconds()),
            "workflow run completed"
        );
        Ok(RunOutcome { state, run })
    }

    /// Executes one node and returns where execution goes next.
    async fn execute(
        &self,
        state: &mut S,
        run: &mut WorkflowRun,
        node: S::Node,
    ) -> Result<Route<S::Node>, EngineError> {
        if run.step_count() >= self.step_limit {
            return Err(EngineError::StepLimitExceeded {
                limit: self.step_limit,
            });
        }

        let step = self.steps.get(&node).ok_or(EngineError::UnknownNode {
            node: node.as_str(),
        })?;

        debug!(node = %node, "executing node");
        let started_at = Utc::now();
        let update = match step.run(state).await {
            Ok(update) => update,
            Err(source) => {
                run.record_visit(node.as_str(), VisitOutcome::Failed, started_at);
                return Err(EngineError::StepFailed {
                    node: node.as_str(),
                    source,
                });
            }
        };
        run.record_visit(node.as_str(), VisitOutcome::Completed, started_at);

        let decided = update.route();
        state.merge(update);

        let next = match self.graph.static_target(node) {
            Some(target) => target,
            None => decided.ok_or(EngineError::MissingRoutingDecision {
                node: node.as_str(),
            })?,
        };
        debug!(node = %node, next = %next, "routing");

        if let Route::Node(target) = next
            && !self.steps.contains_key(&target)
        {
            return Err(EngineError::UnknownNode {
                node: target.as_str(),
            });
        }
        Ok(next)
    }
}

impl<S: GraphState> Default for WorkflowEngine<S> {
    fn default() -> Self {
        Self::new()
    }
}
