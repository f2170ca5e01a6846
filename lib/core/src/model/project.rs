use serde::{Deserialize, Serialize};

/// A planning request as submitted by a caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRequest {
    pub project_name: String,
    #[serde(default)]
    pub project_desc: String,
    /// Path of the task CSV. When absent the configured default is used.
    #[serde(default)]
    pub csv_path: Option<String>,
}

impl ProjectRequest {
    /// Creates a request without a CSV override.
    #[must_use]
    pub fn new(project_name: impl Into<String>, project_desc: impl Into<String>) -> Self {
        Self {
            project_name: project_name.into(),
            project_desc: project_desc.into(),
            csv_path: None,
        }
    }

    /// Sets the task CSV path.
    #[must_use]
    pub fn with_csv_path(mut self, csv_path: impl Into<String>) -> Self {
        self.csv_path = Some(csv_path.into());
        self
    }
}

/// One task area from the task CSV together with its subtasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskArea {
    pub area: String,
    pub subtasks: Vec<String>,
}
