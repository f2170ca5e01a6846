//! Planner configuration.

use serde::{Deserialize, Serialize};
use sprintcraft_planning::SprintPolicy;

fn default_tasks_csv() -> String {
    "data/tasks.csv".to_string()
}

fn default_employees_csv() -> String {
    "data/employees.csv".to_string()
}

fn default_header_row() -> usize {
    1
}

fn default_sprint_length_days() -> u32 {
    sprint_defaults().sprint_length_days
}

fn default_reserved_days() -> u32 {
    sprint_defaults().reserved_days
}

fn default_assignment_batch_size() -> usize {
    3
}

fn default_step_limit() -> usize {
    sprintcraft_workflow::DEFAULT_STEP_LIMIT
}

fn sprint_defaults() -> SprintPolicy {
    SprintPolicy::default()
}

/// How much of the pipeline talks to the language model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Every step runs for real.
    #[default]
    Prod,
    /// Epic and story derivation is skipped; the placeholder epics built
    /// from the task file flow through unchanged.
    Dev,
}

/// Settings shared by every planning run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Task file used when a request does not name one.
    #[serde(default = "default_tasks_csv")]
    pub tasks_csv: String,
    #[serde(default = "default_employees_csv")]
    pub employees_csv: String,
    /// Zero-based row holding the column names; earlier rows are skipped.
    #[serde(default = "default_header_row")]
    pub header_row: usize,
    #[serde(default = "default_sprint_length_days")]
    pub sprint_length_days: u32,
    /// Days per sprint kept free of story work.
    #[serde(default = "default_reserved_days")]
    pub reserved_days: u32,
    /// Stories handed to the assignment advisor per call.
    #[serde(default = "default_assignment_batch_size")]
    pub assignment_batch_size: usize,
    #[serde(default = "default_step_limit")]
    pub step_limit: usize,
    /// Set from the top-level mode setting, never from this section.
    #[serde(skip)]
    pub mode: RunMode,
}

impl PlannerConfig {
    /// The sprint sizing constants.
    #[must_use]
    pub fn sprint_policy(&self) -> SprintPolicy {
        SprintPolicy {
            sprint_length_days: self.sprint_length_days,
            reserved_days: self.reserved_days,
        }
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            tasks_csv: default_tasks_csv(),
            employees_csv: default_employees_csv(),
            header_row: default_header_row(),
            sprint_length_days: default_sprint_length_days(),
            reserved_days: default_reserved_days(),
            assignment_batch_size: default_assignment_batch_size(),
            step_limit: default_step_limit(),
            mode: RunMode::default(),
        }
    }
}
