//! Prompt templates used by the planning steps.

use sprintcraft_ai::{PromptRegistry, PromptTemplate, VariableDefinition};

pub const EPICS: &str = "epics";
pub const STORIES: &str = "stories";
pub const STORY_ORDER: &str = "story_order";
pub const STORY_ASSIGNMENT: &str = "story_assignment";

const SYSTEM: &str = "You are a project planner who turns task lists into Jira work items. \
    Reply only with JSON that follows the requested schema.";

const EPICS_PROMPT: &str = "This is the name of the project: {{project_name}}, this is its \
    description: {{project_description}}. Your job is to create a Jira epic and its details for \
    each of the following domains of work for the project. Do not create epics other than the \
    ones in this list. Domains: {{areas}}. Keep them in the sequential order of their completion. \
    Fill in only the epic title and description. Use each domain name unchanged as the epic title.";

const STORIES_PROMPT: &str = "This is the name of the project: {{project_name}}, this is its \
    description: {{project_description}}. Your job is to identify all the Jira stories that can be \
    created from the list of subtasks under the given domain. Epic: {{area}}, Subtasks: \
    {{subtasks}}. You may break a subtask into several stories if needed. Keep stories in the \
    sequential order of their completion. Fill in only the story title, description, estimate \
    (story points, at most 5) and epic name; the epic name is the domain given above.";

const STORY_ORDER_PROMPT: &str = "This is the name of the project: {{project_name}}, this is its \
    description: {{project_description}}. Your job is to order the stories in the sequence of \
    their completion, noting which stories need to be finished before others and respecting \
    every dependency between them. These are all the stories: {{stories}}. Return just the list \
    of issue_id values in their order of required completion.";

const STORY_ASSIGNMENT_PROMPT: &str = "You are given a list of stories: {{stories}}, along with \
    project details: {{project_details}}. You also have employee bandwidth data: \
    {{employee_bandwidth}}, which includes each employee's skills and availability. Assign each \
    story to the most suitable employee. The employee must have the skills the story needs and \
    the bandwidth to take it on; if they do not, pick another employee who does. Assign every \
    story exactly once, keyed by its issue_id and naming the employee by emp_id. Distribute \
    stories as evenly as possible while keeping skills aligned, and give related or dependent \
    stories to the same employee whenever feasible.";

fn project_variables(template: PromptTemplate) -> PromptTemplate {
    template
        .with_variable("project_name", VariableDefinition::required("Project name"))
        .with_variable(
            "project_description",
            VariableDefinition::optional("Project description").with_default("".into()),
        )
}

/// The registry holding every planning prompt.
#[must_use]
pub fn planner_prompts() -> PromptRegistry {
    let mut registry = PromptRegistry::new();

    registry.register(
        project_variables(PromptTemplate::new(EPICS, EPICS_PROMPT))
            .with_system_prompt(SYSTEM)
            .with_variable("areas", VariableDefinition::required("Task area names")),
    );
    registry.register(
        project_variables(PromptTemplate::new(STORIES, STORIES_PROMPT))
            .with_system_prompt(SYSTEM)
            .with_variable("area", VariableDefinition::required("Task area"))
            .with_variable("subtasks", VariableDefinition::required("Subtasks of the area")),
    );
    registry.register(
        project_variables(PromptTemplate::new(STORY_ORDER, STORY_ORDER_PROMPT))
            .with_system_prompt(SYSTEM)
            .with_variable("stories", VariableDefinition::required("Stories to order")),
    );
    registry.register(
        PromptTemplate::new(STORY_ASSIGNMENT, STORY_ASSIGNMENT_PROMPT)
            .with_system_prompt(SYSTEM)
            .with_variable("stories", VariableDefinition::required("Stories to assign"))
            .with_variable(
                "project_details",
                VariableDefinition::required("Project name and description"),
            )
            .with_variable(
                "employee_bandwidth",
                VariableDefinition::required("Remaining points and skills per employee"),
            ),
    );

    registry
}
