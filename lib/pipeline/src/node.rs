//! The nodes of the planning graph.

use serde::{Deserialize, Serialize};
use sprintcraft_workflow::{NodeCategory, NodeName};
use std::fmt;

/// Every node of the planning graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlannerNode {
    DataManager,
    LoadInputData,
    LoadEmployeeData,
    EpicAndStories,
    UtilsManager,
    EstimateSprintCount,
    JiraManager,
    CreateJiraIssues,
    AgentManager,
    OrderStories,
    StoryAssignee,
    AssignStoryJira,
    EmployeeBandwidthForSprint,
    PlanNextSprint,
    CreateAndUpdateSprint,
}

impl NodeName for PlannerNode {
    fn all() -> &'static [Self] {
        &[
            Self::DataManager,
            Self::LoadInputData,
            Self::LoadEmployeeData,
            Self::EpicAndStories,
            Self::UtilsManager,
            Self::EstimateSprintCount,
            Self::JiraManager,
            Self::CreateJiraIssues,
            Self::AgentManager,
            Self::OrderStories,
            Self::StoryAssignee,
            Self::AssignStoryJira,
            Self::EmployeeBandwidthForSprint,
            Self::PlanNextSprint,
            Self::CreateAndUpdateSprint,
        ]
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::DataManager => "data_manager",
            Self::LoadInputData => "load_input_data",
            Self::LoadEmployeeData => "load_employee_data",
            Self::EpicAndStories => "epic_and_stories",
            Self::UtilsManager => "utils_manager",
            Self::EstimateSprintCount => "estimate_sprint_count",
            Self::JiraManager => "jira_manager",
            Self::CreateJiraIssues => "create_jira_issues",
            Self::AgentManager => "agent_manager",
            Self::OrderStories => "order_stories",
            Self::StoryAssignee => "story_assignee",
            Self::AssignStoryJira => "assign_story_jira",
            Self::EmployeeBandwidthForSprint => "employee_bandwidth_for_sprint",
            Self::PlanNextSprint => "plan_next_sprint",
            Self::CreateAndUpdateSprint => "create_and_update_sprint",
        }
    }

    fn category(&self) -> NodeCategory {
        match self {
            Self::DataManager | Self::UtilsManager | Self::JiraManager | Self::AgentManager => {
                NodeCategory::Router
            }
            Self::LoadInputData | Self::LoadEmployeeData => NodeCategory::Ingest,
            Self::EpicAndStories | Self::OrderStories | Self::StoryAssignee => {
                NodeCategory::AiLayer
            }
            Self::EstimateSprintCount
            | Self::CreateJiraIssues
            | Self::AssignStoryJira
            | Self::EmployeeBandwidthForSprint
            | Self::CreateAndUpdateSprint => NodeCategory::Integration,
            Self::PlanNextSprint => NodeCategory::Compute,
        }
    }
}

impl fmt::Display for PlannerNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
