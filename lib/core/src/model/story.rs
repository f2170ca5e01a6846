use crate::id::{EmployeeId, IssueKey};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Upper bound on a story estimate by planning convention.
///
/// Communicated to the model when stories are derived; nothing downstream
/// relies on it.
pub const MAX_STORY_ESTIMATE: u32 = 5;

/// A unit of work belonging to an epic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Story {
    /// Tracker issue key, empty until the tracker has created the story.
    #[serde(default)]
    pub issue_id: IssueKey,
    /// Short title.
    pub title: String,
    /// Longer description of the work.
    #[serde(default)]
    pub description: String,
    /// Employee chosen to work on the story.
    #[serde(default)]
    pub assignee: Option<EmployeeId>,
    /// Title of the epic (task area) this story belongs to.
    pub epic: String,
    /// Story-point estimate.
    pub estimate: u32,
    /// Tracker sprint the story was pushed into.
    #[serde(default)]
    pub sprint: Option<u64>,
}

impl Story {
    /// Creates an untracked, unassigned story.
    #[must_use]
    pub fn new(title: impl Into<String>, epic: impl Into<String>, estimate: u32) -> Self {
        Self {
            issue_id: IssueKey::default(),
            title: title.into(),
            description: String::new(),
            assignee: None,
            epic: epic.into(),
            estimate,
            sprint: None,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the tracker issue key.
    #[must_use]
    pub fn with_issue_id(mut self, issue_id: impl Into<IssueKey>) -> Self {
        self.issue_id = issue_id.into();
        self
    }

    /// Sets the assignee.
    #[must_use]
    pub fn with_assignee(mut self, assignee: impl Into<EmployeeId>) -> Self {
        self.assignee = Some(assignee.into());
        self
    }

    /// Returns true if the story belongs to the epic with the given title.
    ///
    /// Titles are compared case-insensitively.
    #[must_use]
    pub fn belongs_to(&self, epic_title: &str) -> bool {
        self.epic.to_lowercase() == epic_title.to_lowercase()
    }
}

/// A group of stories covering one task area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Epic {
    /// Tracker issue key, empty until created (or when creation failed).
    #[serde(default)]
    pub epic_id: IssueKey,
    /// Title, matching the task area it was derived from.
    pub title: String,
    /// Description of the epic.
    #[serde(default)]
    pub description: String,
    /// Stories attached to this epic.
    #[serde(default)]
    pub stories: Vec<Story>,
}

impl Epic {
    /// Creates an epic with no stories and no tracker key.
    #[must_use]
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            epic_id: IssueKey::default(),
            title: title.into(),
            description: description.into(),
            stories: Vec::new(),
        }
    }

    /// Returns true if this epic's title matches the area, ignoring case.
    #[must_use]
    pub fn matches_area(&self, area: &str) -> bool {
        self.title.to_lowercase() == area.to_lowercase()
    }
}

/// Stories keyed by tracker issue key, preserving insertion order.
///
/// Order is significant: it carries the priority computed by the ordering
/// step and is the order the allocator walks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Story>", into = "Vec<Story>")]
pub struct StoryMap {
    stories: Vec<Story>,
    index: HashMap<IssueKey, usize>,
}

impl StoryMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a story under its issue key.
    ///
    /// A story with an already present key replaces the existing entry in
    /// place and the previous value is returned.
    pub fn insert(&mut self, story: Story) -> Option<Story> {
        if let Some(&position) = self.index.get(&story.issue_id) {
            return Some(std::mem::replace(&mut self.stories[position], story));
        }
        self.index.insert(story.issue_id.clone(), self.stories.len());
        self.stories.push(story);
        None
    }

    /// Returns the story with the given key.
    #[must_use]
    pub fn get(&self, key: &IssueKey) -> Option<&Story> {
        self.index.get(key).map(|&position| &self.stories[position])
    }

    /// Returns a mutable reference to the story with the given key.
    pub fn get_mut(&mut self, key: &IssueKey) -> Option<&mut Story> {
        self.index
            .get(key)
            .map(|&position| &mut self.stories[position])
    }

    /// Returns true if a story with the given key is present.
    #[must_use]
    pub fn contains_key(&self, key: &IssueKey) -> bool {
        self.index.contains_key(key)
    }

    /// Returns the number of stories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stories.len()
    }

    /// Returns whether the map is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stories.is_empty()
    }

    /// Iterates stories in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Story> {
        self.stories.iter()
    }

    /// Iterates stories mutably in insertion order.
    ///
    /// Issue keys must not be changed through this iterator.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Story> {
        self.stories.iter_mut()
    }

    /// Iterates issue keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &IssueKey> {
        self.stories.iter().map(|story| &story.issue_id)
    }

    /// Total estimate of all stories.
    #[must_use]
    pub fn total_estimate(&self) -> u64 {
        self.stories.iter().map(|s| u64::from(s.estimate)).sum()
    }
}

impl FromIterator<Story> for StoryMap {
    fn from_iter<I: IntoIterator<Item = Story>>(iter: I) -> Self {
        let mut map = Self::new();
        for story in iter {
            map.insert(story);
        }
        map
    }
}

impl IntoIterator for StoryMap {
    type Item = Story;
    type IntoIter = std::vec::IntoIter<Story>;

    fn into_iter(self) -> Self::IntoIter {
        self.stories.into_iter()
    }
}

impl From<Vec<Story>> for StoryMap {
    fn from(stories: Vec<Story>) -> Self {
        stories.into_iter().collect()
    }
}

impl From<StoryMap> for Vec<Story> {
    fn from(map: StoryMap) -> Self {
        map.stories
    }
}
