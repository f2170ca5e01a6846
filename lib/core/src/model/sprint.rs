use crate::model::story::StoryMap;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A fixed-length planning window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sprint {
    /// Sequence number of the sprint within the plan.
    pub id: u32,
    /// Identifier assigned by the tracker once the sprint is created there.
    #[serde(default)]
    pub external_id: Option<u64>,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub goal: String,
    /// Stories admitted into the sprint, in allocation order.
    #[serde(default)]
    pub stories: StoryMap,
}

impl Sprint {
    /// Creates an empty sprint.
    #[must_use]
    pub fn new(id: u32, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            id,
            external_id: None,
            name: format!("Sprint {id}"),
            start_date,
            end_date,
            goal: String::new(),
            stories: StoryMap::new(),
        }
    }

    /// Returns the titles of stories that lack a tracker key.
    #[must_use]
    pub fn untracked_stories(&self) -> Vec<&str> {
        self.stories
            .iter()
            .filter(|story| story.issue_id.is_empty())
            .map(|story| story.title.as_str())
            .collect()
    }
}
