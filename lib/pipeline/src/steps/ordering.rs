use crate::error::{llm_failed, prompt_failed};
use crate::node::PlannerNode;
use crate::prompts::{STORY_ORDER, planner_prompts};
use crate::schema::StoryOrder;
use crate::state::{PlannerState, PlannerUpdate};
use async_trait::async_trait;
use serde_json::{Value as JsonValue, json};
use sprintcraft_ai::{PromptRegistry, StructuredCompleter, complete_as};
use sprintcraft_core::{IssueKey, StoryMap};
use sprintcraft_workflow::{Step, StepError};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Rebuilds `stories` in the order given by `order`.
///
/// Only keys present in `stories` are kept and the first occurrence of a
/// repeated key wins. Stories the order leaves out are dropped.
#[must_use]
pub fn reorder(stories: &StoryMap, order: &[String]) -> StoryMap {
    let mut reordered = StoryMap::new();
    for key in order {
        let key = IssueKey::new(key.as_str());
        if reordered.contains_key(&key) {
            continue;
        }
        match stories.get(&key) {
            Some(story) => {
                reordered.insert(story.clone());
            }
            None => debug!(%key, "ignoring unknown issue key in story order"),
        }
    }
    reordered
}

/// Asks the model for a dependency-respecting completion order.
pub struct OrderStories {
    completer: Arc<dyn StructuredCompleter>,
    prompts: PromptRegistry,
}

impl OrderStories {
    #[must_use]
    pub fn new(completer: Arc<dyn StructuredCompleter>) -> Self {
        Self {
            completer,
            prompts: planner_prompts(),
        }
    }
}

#[async_trait]
impl Step<PlannerState> for OrderStories {
    async fn run(&self, state: &PlannerState) -> Result<PlannerUpdate, StepError> {
        let stories: Vec<JsonValue> = state
            .stories_by_id
            .iter()
            .map(|story| {
                json!({
                    "issue_id": story.issue_id,
                    "epic": story.epic,
                    "title": story.title,
                    "description": story.description,
                })
            })
            .collect();
        let variables = HashMap::from([
            ("project_name".to_string(), json!(state.input.project_name)),
            ("project_description".to_string(), json!(state.input.project_desc)),
            ("stories".to_string(), JsonValue::Array(stories)),
        ]);

        let call = self
            .prompts
            .get(STORY_ORDER)
            .and_then(|template| template.to_call(&variables))
            .map_err(|e| prompt_failed(&e))?;
        let reply: StoryOrder = complete_as(self.completer.as_ref(), call)
            .await
            .map_err(llm_failed)?;

        let ordered = reorder(&state.stories_by_id, &reply.stories);
        info!(
            returned = reply.stories.len(),
            kept = ordered.len(),
            dropped = state.stories_by_id.len() - ordered.len(),
            "stories ordered"
        );
        Ok(PlannerUpdate {
            stories_by_id: Some(ordered),
            ..PlannerUpdate::goto(PlannerNode::StoryAssignee)
        })
    }
}
