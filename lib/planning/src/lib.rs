//! Sprint capacity estimation and allocation.
//!
//! - [`calendar`]: weekday and holiday arithmetic
//! - [`capacity`]: project duration and per-employee bandwidth
//! - [`allocator`]: strict sequential-fit admission of ordered stories

pub mod allocator;
pub mod calendar;
pub mod capacity;
pub mod error;

pub use allocator::{AllocationOutcome, Halt, HaltReason, allocate_to_sprint};
pub use calendar::{
    Horizon, is_weekday, is_working_day, working_day_horizon, working_days_in_window,
};
pub use capacity::{
    DEFAULT_RESERVED_DAYS, DEFAULT_SPRINT_LENGTH_DAYS, ProjectEstimate, SprintBandwidth,
    SprintPolicy, estimate_project_duration, estimate_working_days, holiday_window,
    next_sprint_bandwidth,
};
pub use error::CapacityError;
