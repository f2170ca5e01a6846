//! Shapes the language model is asked to reply in.

use serde::Deserialize;
use serde_json::{Value as JsonValue, json};
use sprintcraft_ai::OutputSchema;
use sprintcraft_core::{Epic, MAX_STORY_ESTIMATE, Story};
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EpicDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

impl From<EpicDraft> for Epic {
    fn from(draft: EpicDraft) -> Self {
        Epic::new(draft.title, draft.description)
    }
}

/// Epics derived from the task areas.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EpicList {
    pub epics: Vec<EpicDraft>,
}

impl OutputSchema for EpicList {
    const NAME: &'static str = "epic_list";

    fn schema() -> JsonValue {
        json!({
            "type": "object",
            "properties": {
                "epics": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "title": {"type": "string"},
                            "description": {"type": "string"}
                        },
                        "required": ["title", "description"]
                    }
                }
            },
            "required": ["epics"]
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StoryDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub epic: String,
    pub estimate: u32,
}

impl From<StoryDraft> for Story {
    fn from(draft: StoryDraft) -> Self {
        let estimate = if draft.estimate > MAX_STORY_ESTIMATE {
            debug!(title = %draft.title, estimate = draft.estimate, "clamping story estimate");
            MAX_STORY_ESTIMATE
        } else {
            draft.estimate
        };
        Story::new(draft.title, draft.epic, estimate).with_description(draft.description)
    }
}

/// Stories derived from one area's subtasks.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StoryList {
    pub stories: Vec<StoryDraft>,
}

impl OutputSchema for StoryList {
    const NAME: &'static str = "story_list";

    fn schema() -> JsonValue {
        json!({
            "type": "object",
            "properties": {
                "stories": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "title": {"type": "string"},
                            "description": {"type": "string"},
                            "epic": {"type": "string", "description": "Epic name from the area given"},
                            "estimate": {
                                "type": "integer",
                                "minimum": 1,
                                "maximum": MAX_STORY_ESTIMATE,
                                "description": "Story points, realistic, at most 5"
                            }
                        },
                        "required": ["title", "description", "epic", "estimate"]
                    }
                }
            },
            "required": ["stories"]
        })
    }
}

/// Issue keys in the order the stories should be completed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StoryOrder {
    pub stories: Vec<String>,
}

impl OutputSchema for StoryOrder {
    const NAME: &'static str = "story_order";

    fn schema() -> JsonValue {
        json!({
            "type": "object",
            "properties": {
                "stories": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "Issue ids in their order of required completion"
                }
            },
            "required": ["stories"]
        })
    }
}

/// Issue key to employee id.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StoryAssignments {
    pub story_employee_mapping: BTreeMap<String, String>,
}

impl OutputSchema for StoryAssignments {
    const NAME: &'static str = "story_employee_mapping";

    fn schema() -> JsonValue {
        json!({
            "type": "object",
            "properties": {
                "story_employee_mapping": {
                    "type": "object",
                    "additionalProperties": {"type": "string"},
                    "description": "Mapping of the issue_id of a story to the emp_id of an employee"
                }
            },
            "required": ["story_employee_mapping"]
        })
    }
}
