//! Node bodies of the planning graph.
//!
//! Every computational step records where the run should go after it in
//! `next`; the router nodes re-emit that decision.

mod assign;
mod capacity;
mod derive;
mod ingest;
mod ordering;
mod sprint;
mod tracker;

pub use assign::StoryAssignee;
pub use capacity::{EmployeeBandwidthForSprint, EstimateSprintCount};
pub use derive::EpicAndStories;
pub use ingest::{LoadEmployeeData, LoadInputData, data_manager};
pub use ordering::{OrderStories, reorder};
pub use sprint::plan_next_sprint;
pub use tracker::{AssignStoryJira, CreateAndUpdateSprint, CreateJiraIssues};

use crate::state::PlannerState;
use sprintcraft_core::TaskArea;
use sprintcraft_workflow::StepError;

/// The task areas, which every step after ingestion relies on.
fn loaded_tasks(state: &PlannerState) -> Result<&[TaskArea], StepError> {
    state
        .tasks_by_area
        .as_deref()
        .ok_or_else(|| StepError::InconsistentState {
            message: "task areas have not been loaded".to_string(),
        })
}
