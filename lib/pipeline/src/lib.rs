//! The sprint planning workflow for sprintcraft.
//!
//! - **Ingest**: task and roster CSV readers ([`read_tasks`], [`read_employees`])
//! - **State**: [`PlannerState`] and its partial [`PlannerUpdate`]
//! - **Steps**: one step per [`PlannerNode`], from loading inputs to filing
//!   the sprint with the tracker
//! - **Planner**: the wired engine ([`build_planner_engine`]) and the
//!   request-level [`Planner`] facade

pub mod assignment;
pub mod config;
pub mod error;
pub mod node;
pub mod planner;
pub mod prompts;
pub mod roster;
pub mod schema;
pub mod state;
pub mod steps;

pub use assignment::{
    AssignmentAdvisor, AssignmentProposal, LlmAssignmentAdvisor, apply_assignments,
};
pub use config::{PlannerConfig, RunMode};
pub use error::{AdvisorError, IngestError};
pub use node::PlannerNode;
pub use planner::{Collaborators, Planner, build_planner_engine};
pub use roster::{parse_leaves, parse_skills, read_employees, read_tasks};
pub use state::{PlannerState, PlannerUpdate};
