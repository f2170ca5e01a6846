use crate::node::PlannerNode;
use crate::state::{PlannerState, PlannerUpdate};
use sprintcraft_planning::allocate_to_sprint;
use sprintcraft_workflow::StepError;
use tracing::info;

/// Fills the next sprint with the longest prefix of the ordered stories
/// that fits everyone's bandwidth.
///
/// # Errors
///
/// Fails if no sprint has been sized yet.
pub fn plan_next_sprint(state: &PlannerState) -> Result<PlannerUpdate, StepError> {
    let Some(sprint) = &state.next_sprint else {
        return Err(StepError::InconsistentState {
            message: "next sprint has not been sized".to_string(),
        });
    };

    let mut bandwidth = state.employee_bandwidth.clone();
    let outcome = allocate_to_sprint(state.stories_by_id.iter(), &mut bandwidth);

    let mut sprint = sprint.clone();
    sprint.stories = outcome.admitted;
    info!(
        sprint = %sprint.name,
        stories = sprint.stories.len(),
        points = sprint.stories.total_estimate(),
        complete = outcome.halted.is_none(),
        "next sprint planned"
    );

    Ok(PlannerUpdate {
        next_sprint: Some(sprint),
        employee_bandwidth: Some(bandwidth),
        sprint_halt: Some(outcome.halted),
        ..PlannerUpdate::goto(PlannerNode::CreateAndUpdateSprint)
    })
}
