//! Story assignment.
//!
//! An [`AssignmentAdvisor`] proposes an employee for each story in a batch.
//! The proposal is applied by [`apply_assignments`], which is the only place
//! assignees and bandwidth change.

use crate::error::AdvisorError;
use crate::prompts::{STORY_ASSIGNMENT, planner_prompts};
use crate::schema::StoryAssignments;
use async_trait::async_trait;
use rootcause::prelude::Report;
use serde_json::{Value as JsonValue, json};
use sprintcraft_ai::{PromptRegistry, StructuredCompleter, complete_as};
use sprintcraft_core::{BandwidthMap, EmployeeId, IssueKey, ProjectRequest, Roster, Story, StoryMap};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Issue key to proposed employee.
pub type AssignmentProposal = BTreeMap<IssueKey, EmployeeId>;

/// Proposes who should work on each story.
#[async_trait]
pub trait AssignmentAdvisor: Send + Sync {
    /// Proposes an assignee for each story in `batch`.
    ///
    /// # Errors
    ///
    /// Returns an error if no proposal could be produced.
    async fn assign(
        &self,
        batch: &[Story],
        bandwidth: &BandwidthMap,
        project: &ProjectRequest,
    ) -> Result<AssignmentProposal, Report<AdvisorError>>;
}

/// Advisor that asks the language model, weighing skills, remaining
/// bandwidth and even distribution in one structured call.
pub struct LlmAssignmentAdvisor {
    completer: Arc<dyn StructuredCompleter>,
    prompts: PromptRegistry,
}

impl LlmAssignmentAdvisor {
    #[must_use]
    pub fn new(completer: Arc<dyn StructuredCompleter>) -> Self {
        Self {
            completer,
            prompts: planner_prompts(),
        }
    }
}

fn story_summary(story: &Story) -> JsonValue {
    json!({
        "issue_id": story.issue_id,
        "title": story.title,
        "description": story.description,
        "epic": story.epic,
        "estimate": story.estimate,
    })
}

#[async_trait]
impl AssignmentAdvisor for LlmAssignmentAdvisor {
    #[instrument(skip_all, fields(batch = batch.len()))]
    async fn assign(
        &self,
        batch: &[Story],
        bandwidth: &BandwidthMap,
        project: &ProjectRequest,
    ) -> Result<AssignmentProposal, Report<AdvisorError>> {
        let variables: HashMap<String, JsonValue> = [
            (
                "stories".to_string(),
                JsonValue::Array(batch.iter().map(story_summary).collect()),
            ),
            (
                "project_details".to_string(),
                json!({
                    "project_name": project.project_name,
                    "project_description": project.project_desc,
                }),
            ),
            ("employee_bandwidth".to_string(), json!(bandwidth)),
        ]
        .into_iter()
        .collect();

        let call = self
            .prompts
            .get(STORY_ASSIGNMENT)
            .and_then(|template| template.to_call(&variables))
            .map_err(|e| AdvisorError::Prompt {
                reason: e.to_string(),
            })?;

        let reply: StoryAssignments = complete_as(self.completer.as_ref(), call)
            .await
            .map_err(|e| AdvisorError::Completion {
                reason: e.to_string(),
            })?;

        debug!(proposed = reply.story_employee_mapping.len(), "assignment proposal received");
        Ok(reply
            .story_employee_mapping
            .into_iter()
            .map(|(issue, employee)| (IssueKey::new(issue), EmployeeId::new(employee)))
            .collect())
    }
}

/// Applies a proposal: sets each story's assignee, deducts its estimate
/// from the employee's remaining points and records it as their latest
/// story.
///
/// Unknown stories and employees are skipped. Bandwidth is deducted even
/// when it goes negative; sprint allocation is what enforces capacity.
/// Returns the number of stories assigned.
pub fn apply_assignments(
    proposal: &AssignmentProposal,
    stories: &mut StoryMap,
    bandwidth: &mut BandwidthMap,
    roster: &Roster,
) -> usize {
    let mut applied = 0;
    for (issue, employee) in proposal {
        let Some(story) = stories.get_mut(issue) else {
            warn!(%issue, "proposal names an unknown story");
            continue;
        };
        if !roster.contains_key(employee) {
            warn!(%issue, %employee, "proposal names an unknown employee");
            continue;
        }

        story.assignee = Some(employee.clone());
        if let Some(capacity) = bandwidth.get_mut(employee) {
            capacity.remaining_points -= i64::from(story.estimate);
            capacity.last_story = Some(story.title.clone());
        }
        applied += 1;
    }
    applied
}

#[cfg(test)]
mod tests {
    use super::*;
    use sprintcraft_ai::{CompletionError, LlmRequest};
    use sprintcraft_core::{Employee, EmployeeCapacity};
    use std::sync::Mutex;

    fn roster() -> Roster {
        [Employee::new("E1", "Asha", "asha@example.com")]
            .into_iter()
            .map(|employee| (employee.emp_id.clone(), employee))
            .collect()
    }

    fn stories() -> StoryMap {
        [
            Story::new("Schema", "Backend", 3).with_issue_id("AI1-1"),
            Story::new("API", "Backend", 2).with_issue_id("AI1-2"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn applying_deducts_and_records_last_story() {
        let mut stories = stories();
        let mut bandwidth = BandwidthMap::new();
        bandwidth.insert("E1".into(), EmployeeCapacity::new("Asha", 4));
        let proposal: AssignmentProposal = [
            ("AI1-1".into(), "E1".into()),
            ("AI1-2".into(), "E1".into()),
        ]
        .into_iter()
        .collect();

        let applied = apply_assignments(&proposal, &mut stories, &mut bandwidth, &roster());

        assert_eq!(applied, 2);
        let capacity = &bandwidth[&EmployeeId::new("E1")];
        assert_eq!(capacity.remaining_points, -1);
        assert_eq!(capacity.last_story.as_deref(), Some("API"));
        assert_eq!(
            stories.get(&"AI1-1".into()).unwrap().assignee,
            Some(EmployeeId::new("E1"))
        );
    }

    #[test]
    fn unknown_story_and_employee_are_skipped() {
        let mut stories = stories();
        let mut bandwidth = BandwidthMap::new();
        let proposal: AssignmentProposal = [
            ("AI1-9".into(), "E1".into()),
            ("AI1-1".into(), "E7".into()),
        ]
        .into_iter()
        .collect();

        let applied = apply_assignments(&proposal, &mut stories, &mut bandwidth, &roster());

        assert_eq!(applied, 0);
        assert!(stories.iter().all(|story| story.assignee.is_none()));
    }

    /// Completer that records the prompt and replies with a fixed mapping.
    struct ScriptedCompleter {
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl StructuredCompleter for ScriptedCompleter {
        async fn complete(
            &self,
            request: LlmRequest,
        ) -> Result<JsonValue, Report<CompletionError>> {
            self.prompts.lock().unwrap().push(request.prompt.clone());
            Ok(json!({"story_employee_mapping": {"AI1-1": "E1"}}))
        }
    }

    #[tokio::test]
    async fn llm_advisor_sends_bandwidth_and_parses_mapping() {
        let completer = Arc::new(ScriptedCompleter {
            prompts: Mutex::new(Vec::new()),
        });
        let advisor = LlmAssignmentAdvisor::new(completer.clone());
        let mut bandwidth = BandwidthMap::new();
        bandwidth.insert("E1".into(), EmployeeCapacity::new("Asha", 10));
        let batch: Vec<Story> = stories().into_iter().collect();

        let proposal = advisor
            .assign(&batch, &bandwidth, &ProjectRequest::new("Atlas", "Tooling"))
            .await
            .unwrap();

        assert_eq!(proposal.get(&IssueKey::new("AI1-1")), Some(&EmployeeId::new("E1")));
        let prompts = completer.prompts.lock().unwrap();
        assert!(prompts[0].contains("\"remaining_points\":10"));
        assert!(prompts[0].contains("AI1-2"));
    }
}
