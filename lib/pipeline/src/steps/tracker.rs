use crate::error::tracker_failed;
use crate::node::PlannerNode;
use crate::state::{PlannerState, PlannerUpdate};
use async_trait::async_trait;
use sprintcraft_core::{IssueKey, StoryMap};
use sprintcraft_integration::{IssueTracker, RetryPolicy, create_story_with_retry};
use sprintcraft_workflow::{Route, Step, StepError};
use std::sync::Arc;
use tracing::{info, warn};

/// Creates every epic, then every story under its epic, in the tracker.
///
/// An epic the tracker rejects is skipped along with its stories. A story
/// that still fails after its retries aborts the run.
pub struct CreateJiraIssues {
    tracker: Arc<dyn IssueTracker>,
    retry: RetryPolicy,
}

impl CreateJiraIssues {
    #[must_use]
    pub fn new(tracker: Arc<dyn IssueTracker>, retry: RetryPolicy) -> Self {
        Self { tracker, retry }
    }
}

#[async_trait]
impl Step<PlannerState> for CreateJiraIssues {
    async fn run(&self, state: &PlannerState) -> Result<PlannerUpdate, StepError> {
        let mut epics = state.epics.clone();
        for epic in &mut epics {
            match self.tracker.create_epic(&epic.title, &epic.description).await {
                Some(key) => epic.epic_id = key,
                None => warn!(epic = %epic.title, "epic not created, its stories will be skipped"),
            }
        }

        let mut stories_by_id = StoryMap::new();
        for story in &state.ordered_stories {
            let Some(epic) = epics
                .iter()
                .find(|epic| !epic.epic_id.is_empty() && story.belongs_to(&epic.title))
            else {
                warn!(
                    story = %story.title,
                    epic = %story.epic,
                    "no created epic for story, skipping"
                );
                continue;
            };

            let key = create_story_with_retry(
                self.tracker.as_ref(),
                &self.retry,
                &story.title,
                &story.description,
                &epic.epic_id,
            )
            .await
            .map_err(tracker_failed)?;
            stories_by_id.insert(story.clone().with_issue_id(key));
        }

        for epic in &mut epics {
            epic.stories = stories_by_id
                .iter()
                .filter(|story| story.belongs_to(&epic.title))
                .cloned()
                .collect();
        }

        info!(
            epics = epics.iter().filter(|epic| !epic.epic_id.is_empty()).count(),
            stories = stories_by_id.len(),
            "tracker issues created"
        );
        Ok(PlannerUpdate {
            epics: Some(epics),
            stories_by_id: Some(stories_by_id),
            ..PlannerUpdate::goto(PlannerNode::OrderStories)
        })
    }
}

/// Mirrors story assignees into the tracker. Failures are only logged.
pub struct AssignStoryJira {
    tracker: Arc<dyn IssueTracker>,
}

impl AssignStoryJira {
    #[must_use]
    pub fn new(tracker: Arc<dyn IssueTracker>) -> Self {
        Self { tracker }
    }
}

#[async_trait]
impl Step<PlannerState> for AssignStoryJira {
    async fn run(&self, state: &PlannerState) -> Result<PlannerUpdate, StepError> {
        let mut assigned = 0usize;
        for story in state.stories_by_id.iter() {
            let Some(assignee) = &story.assignee else {
                continue;
            };
            let Some(employee) = state.employees_by_id.get(assignee) else {
                warn!(issue = %story.issue_id, %assignee, "assignee not on the roster");
                continue;
            };

            if self.tracker.assign_story(&story.issue_id, &employee.email).await {
                assigned += 1;
            } else {
                warn!(
                    issue = %story.issue_id,
                    email = %employee.email,
                    "tracker assignment failed"
                );
            }
        }

        info!(assigned, stories = state.stories_by_id.len(), "assignees pushed to tracker");
        Ok(PlannerUpdate::goto(PlannerNode::EmployeeBandwidthForSprint))
    }
}

/// Creates the planned sprint in the tracker and moves its stories into it.
pub struct CreateAndUpdateSprint {
    tracker: Arc<dyn IssueTracker>,
}

impl CreateAndUpdateSprint {
    #[must_use]
    pub fn new(tracker: Arc<dyn IssueTracker>) -> Self {
        Self { tracker }
    }
}

#[async_trait]
impl Step<PlannerState> for CreateAndUpdateSprint {
    async fn run(&self, state: &PlannerState) -> Result<PlannerUpdate, StepError> {
        let Some(sprint) = &state.next_sprint else {
            return Err(StepError::InconsistentState {
                message: "no sprint has been planned".to_string(),
            });
        };

        let untracked = sprint.untracked_stories();
        if !untracked.is_empty() {
            return Err(StepError::InconsistentState {
                message: format!("sprint stories without an issue key: {}", untracked.join(", ")),
            });
        }

        let sprint_id = self
            .tracker
            .create_sprint(&sprint.name, sprint.start_date, sprint.end_date)
            .await
            .map_err(tracker_failed)?;

        let keys: Vec<IssueKey> = sprint.stories.keys().cloned().collect();
        let assigned = self.tracker.assign_stories_to_sprint(sprint_id, &keys).await;
        if assigned < keys.len() {
            warn!(sprint_id, assigned, planned = keys.len(), "sprint only partially filled");
        } else {
            info!(sprint_id, assigned, "sprint created");
        }

        let mut sprint = sprint.clone();
        sprint.external_id = Some(sprint_id);
        for story in sprint.stories.iter_mut() {
            story.sprint = Some(sprint_id);
        }

        Ok(PlannerUpdate {
            next_sprint: Some(sprint),
            sprint_assigned: Some(assigned),
            ..PlannerUpdate::goto(Route::End)
        })
    }
}
