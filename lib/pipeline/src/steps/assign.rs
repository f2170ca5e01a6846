use crate::assignment::{AssignmentAdvisor, apply_assignments};
use crate::error::llm_failed;
use crate::node::PlannerNode;
use crate::state::{PlannerState, PlannerUpdate};
use async_trait::async_trait;
use sprintcraft_core::Story;
use sprintcraft_workflow::{Step, StepError};
use std::sync::Arc;
use tracing::info;

/// Assigns stories in fixed-size batches, feeding each batch the bandwidth
/// left after the previous ones.
pub struct StoryAssignee {
    advisor: Arc<dyn AssignmentAdvisor>,
    batch_size: usize,
}

impl StoryAssignee {
    /// A zero batch size is treated as one.
    #[must_use]
    pub fn new(advisor: Arc<dyn AssignmentAdvisor>, batch_size: usize) -> Self {
        Self {
            advisor,
            batch_size: batch_size.max(1),
        }
    }
}

#[async_trait]
impl Step<PlannerState> for StoryAssignee {
    async fn run(&self, state: &PlannerState) -> Result<PlannerUpdate, StepError> {
        let mut stories = state.stories_by_id.clone();
        let mut bandwidth = state.employee_bandwidth.clone();
        let pending: Vec<Story> = stories.iter().cloned().collect();

        let mut assigned = 0;
        for (index, batch) in pending.chunks(self.batch_size).enumerate() {
            let proposal = self
                .advisor
                .assign(batch, &bandwidth, &state.input)
                .await
                .map_err(llm_failed)?;
            let applied =
                apply_assignments(&proposal, &mut stories, &mut bandwidth, &state.employees_by_id);
            info!(batch = index, size = batch.len(), applied, "batch assigned");
            assigned += applied;
        }

        info!(assigned, stories = stories.len(), "stories assigned");
        Ok(PlannerUpdate {
            stories_by_id: Some(stories),
            employee_bandwidth: Some(bandwidth),
            ..PlannerUpdate::goto(PlannerNode::AssignStoryJira)
        })
    }
}
