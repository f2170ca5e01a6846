//! Planning domain model.
//!
//! - [`Epic`] and [`Story`]: hierarchical planning units derived from the task CSV
//! - [`Employee`]: roster entry with skills and planned leave
//! - [`EmployeeCapacity`]: remaining story-point bandwidth for a date window
//! - [`Sprint`]: a fixed-length planning window with its admitted stories

mod employee;
mod project;
mod sprint;
mod story;

pub use employee::{BandwidthMap, Employee, EmployeeCapacity, Leave, Proficiency, Roster, Skill};
pub use project::{ProjectRequest, TaskArea};
pub use sprint::Sprint;
pub use story::{Epic, MAX_STORY_ESTIMATE, Story, StoryMap};
