//! The contract between the engine and the state it threads through a run.
//!
//! Steps never mutate the state directly. Each step receives a shared borrow
//! and returns an update; the engine owns the state for the whole run and is
//! the only party that merges updates into it.

use crate::node::{NodeName, Route};

/// A partial state returned by a step.
pub trait StateUpdate<N>: Default + Send {
    /// The routing decision carried by this update, if any.
    fn route(&self) -> Option<Route<N>>;

    /// Builds an update that carries nothing but a routing decision.
    fn routed(route: Route<N>) -> Self;
}

/// State threaded through a workflow run.
pub trait GraphState: Send + Sync + 'static {
    /// The node identifiers of the graph this state runs on.
    type Node: NodeName;
    /// The partial update steps return.
    type Update: StateUpdate<Self::Node>;

    /// Merges an update. Fields present in the update overwrite the current
    /// values; everything else persists.
    fn merge(&mut self, update: Self::Update);

    /// The most recent routing decision held by the state.
    fn routing(&self) -> Option<Route<Self::Node>>;
}
