//! External collaborators for sprintcraft.
//!
//! This crate provides:
//!
//! - **Issue tracker**: the [`IssueTracker`] trait, the Jira REST client and
//!   retried story creation
//! - **Holiday source**: public holidays by country and year
//! - **Retry**: bounded fixed-delay retry for flaky calls

pub mod error;
pub mod holiday;
pub mod jira;
pub mod retry;
pub mod tracker;

pub use error::{HolidayError, TrackerError};
pub use holiday::{HolidayConfig, HolidaySource, NagerDateClient, StaticHolidays, holidays_in_range};
pub use jira::{JiraClient, JiraConfig};
pub use retry::{RetryPolicy, RetryResult, retry_async};
pub use tracker::{IssueTracker, create_story_with_retry};
