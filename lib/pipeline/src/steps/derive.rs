use super::loaded_tasks;
use crate::config::RunMode;
use crate::error::{llm_failed, prompt_failed};
use crate::node::PlannerNode;
use crate::prompts::{EPICS, STORIES, planner_prompts};
use crate::schema::{EpicList, StoryList};
use crate::state::{PlannerState, PlannerUpdate};
use async_trait::async_trait;
use serde_json::{Value as JsonValue, json};
use sprintcraft_ai::{PromptRegistry, StructuredCompleter, complete_as};
use sprintcraft_core::{Epic, ProjectRequest, Story};
use sprintcraft_workflow::{Step, StepError};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Derives epics from the task areas, then stories for each area.
pub struct EpicAndStories {
    completer: Arc<dyn StructuredCompleter>,
    prompts: PromptRegistry,
    mode: RunMode,
}

impl EpicAndStories {
    #[must_use]
    pub fn new(completer: Arc<dyn StructuredCompleter>, mode: RunMode) -> Self {
        Self {
            completer,
            prompts: planner_prompts(),
            mode,
        }
    }

    async fn ask<T: sprintcraft_ai::OutputSchema>(
        &self,
        template: &str,
        variables: &HashMap<String, JsonValue>,
    ) -> Result<T, StepError> {
        let call = self
            .prompts
            .get(template)
            .and_then(|template| template.to_call(variables))
            .map_err(|e| prompt_failed(&e))?;
        complete_as(self.completer.as_ref(), call)
            .await
            .map_err(llm_failed)
    }
}

fn project_variables(input: &ProjectRequest) -> HashMap<String, JsonValue> {
    HashMap::from([
        ("project_name".to_string(), json!(input.project_name)),
        ("project_description".to_string(), json!(input.project_desc)),
    ])
}

#[async_trait]
impl Step<PlannerState> for EpicAndStories {
    async fn run(&self, state: &PlannerState) -> Result<PlannerUpdate, StepError> {
        if self.mode == RunMode::Dev {
            info!("dev mode, keeping placeholder epics");
            return Ok(PlannerUpdate::goto(PlannerNode::EstimateSprintCount));
        }

        let tasks = loaded_tasks(state)?;
        info!(areas = tasks.len(), "identifying epics");

        let mut variables = project_variables(&state.input);
        let areas: Vec<&str> = tasks.iter().map(|task| task.area.as_str()).collect();
        variables.insert("areas".to_string(), json!(areas));
        let reply: EpicList = self.ask(EPICS, &variables).await?;
        let mut epics: Vec<Epic> = reply.epics.into_iter().map(Epic::from).collect();

        let mut ordered_stories: Vec<Story> = Vec::new();
        for task in tasks {
            info!(area = %task.area, "identifying stories");
            let mut variables = project_variables(&state.input);
            variables.insert("area".to_string(), json!(task.area));
            variables.insert("subtasks".to_string(), json!(task.subtasks));
            let reply: StoryList = self.ask(STORIES, &variables).await?;
            let stories: Vec<Story> = reply.stories.into_iter().map(Story::from).collect();

            let mut attached = false;
            for epic in epics.iter_mut().filter(|epic| epic.matches_area(&task.area)) {
                epic.stories = stories.clone();
                attached = true;
            }
            if !attached {
                warn!(area = %task.area, "no epic matches area, stories stay unattached");
            }
            ordered_stories.extend(stories);
        }

        info!(
            epics = epics.len(),
            stories = ordered_stories.len(),
            "epics and stories identified"
        );
        Ok(PlannerUpdate {
            epics: Some(epics),
            ordered_stories: Some(ordered_stories),
            ..PlannerUpdate::goto(PlannerNode::EstimateSprintCount)
        })
    }
}
