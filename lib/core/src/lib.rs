//! Core domain types and utilities for the sprintcraft planner.
//!
//! This crate provides the foundational types, error handling, and the
//! planning domain model (epics, stories, employees, sprints) shared by
//! every other crate in the workspace.

pub mod error;
pub mod id;
pub mod model;

pub use error::Result;
pub use id::{EmployeeId, IssueKey, ParseIdError, WorkflowRunId};
pub use model::{
    BandwidthMap, Employee, EmployeeCapacity, Epic, Leave, MAX_STORY_ESTIMATE, Proficiency,
    ProjectRequest, Roster, Skill, Sprint, Story, StoryMap, TaskArea,
};
