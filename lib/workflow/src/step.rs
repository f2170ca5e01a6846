//! Step execution.
//!
//! A step is the body of a node. Steps are async so they can await network
//! collaborators, but the engine runs exactly one at a time.

use crate::error::StepError;
use crate::state::{GraphState, StateUpdate};
use async_trait::async_trait;

/// Trait for node bodies.
///
/// This abstraction allows testing the engine with closures and plugging in
/// collaborator-backed steps in production.
#[async_trait]
pub trait Step<S: GraphState>: Send + Sync {
    /// Executes the step against the current state and returns the update to
    /// merge.
    ///
    /// # Errors
    ///
    /// Any error aborts the run; the engine does not retry.
    async fn run(&self, state: &S) -> Result<S::Update, StepError>;
}

/// Adapter turning a synchronous closure into a [`Step`].
pub struct FnStep<F>(pub F);

#[async_trait]
impl<S, F> Step<S> for FnStep<F>
where
    S: GraphState,
    F: Fn(&S) -> Result<S::Update, StepError> + Send + Sync,
{
    async fn run(&self, state: &S) -> Result<S::Update, StepError> {
        (self.0)(state)
    }
}

/// A step with no computation that re-emits the routing decision already
/// held by the state.
///
/// Several computational nodes share one router so they can reuse its
/// edges. A state without a decision yields an update without one, which the
/// engine reports as a missing routing decision.
#[derive(Debug, Clone, Copy, Default)]
pub struct Router;

#[async_trait]
impl<S: GraphState> Step<S> for Router {
    async fn run(&self, state: &S) -> Result<S::Update, StepError> {
        Ok(state
            .routing()
            .map(S::Update::routed)
            .unwrap_or_default())
    }
}
