//! Capacity planning.
//!
//! Turns story-point totals and roster leave into two numbers per employee:
//! bandwidth over the whole project horizon, and bandwidth for the next
//! sprint. Both are estimates; project bandwidth may go negative when leave
//! exceeds the available days.

use crate::calendar::{Horizon, working_day_horizon, working_days_in_window};
use crate::error::CapacityError;
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use sprintcraft_core::{BandwidthMap, EmployeeCapacity, Roster, Sprint, Story};
use std::collections::HashSet;
use tracing::{debug, info};

/// Sprint length in calendar days.
pub const DEFAULT_SPRINT_LENGTH_DAYS: u32 = 14;

/// Days per sprint held back for meetings and overhead.
pub const DEFAULT_RESERVED_DAYS: u32 = 4;

/// Fixed sprint sizing constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SprintPolicy {
    pub sprint_length_days: u32,
    pub reserved_days: u32,
}

impl Default for SprintPolicy {
    fn default() -> Self {
        Self {
            sprint_length_days: DEFAULT_SPRINT_LENGTH_DAYS,
            reserved_days: DEFAULT_RESERVED_DAYS,
        }
    }
}

/// Whole-project duration estimate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectEstimate {
    /// `floor(total points / employee count)`.
    pub estimated_days: u64,
    pub horizon: Horizon,
    /// Per-employee bandwidth over the horizon, with skills attached.
    pub bandwidth: BandwidthMap,
}

/// Next-sprint sizing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SprintBandwidth {
    pub bandwidth: BandwidthMap,
    /// Usable weekday slots in the sprint window.
    pub available_days: usize,
    /// Empty sprint covering the window.
    pub sprint: Sprint,
}

/// Working days needed to burn down `total_points` with `employee_count`
/// people, rounded down.
///
/// # Errors
///
/// Returns `NoEmployees` if `employee_count` is zero.
pub fn estimate_working_days(
    total_points: u64,
    employee_count: usize,
) -> Result<u64, CapacityError> {
    if employee_count == 0 {
        return Err(CapacityError::NoEmployees);
    }
    Ok(total_points / employee_count as u64)
}

/// The date range to fetch holidays for, `[start, start + 2 * estimated_days]`.
#[must_use]
pub fn holiday_window(start: NaiveDate, estimated_days: u64) -> (NaiveDate, NaiveDate) {
    (start, start + Days::new(2 * estimated_days))
}

/// Estimates the project duration and each employee's bandwidth over it.
///
/// `start` is the first candidate working day (tomorrow, in production).
///
/// # Errors
///
/// Returns `NoEmployees` for an empty roster.
pub fn estimate_project_duration<'a>(
    stories: impl IntoIterator<Item = &'a Story>,
    employees: &Roster,
    holidays: &HashSet<NaiveDate>,
    start: NaiveDate,
) -> Result<ProjectEstimate, CapacityError> {
    let total_points: u64 = stories.into_iter().map(|story| u64::from(story.estimate)).sum();
    let estimated_days = estimate_working_days(total_points, employees.len())?;
    let horizon = working_day_horizon(start, estimated_days, holidays);
    debug!(
        total_points,
        estimated_days,
        horizon_end = %horizon.end,
        "computed project horizon"
    );

    let available = i64::try_from(horizon.working_days).unwrap_or(i64::MAX);
    let bandwidth = employees
        .iter()
        .map(|(id, employee)| {
            let leave = employee.leave_days_between(start, horizon.end) as i64;
            let capacity = EmployeeCapacity::new(employee.name.clone(), available - leave)
                .with_skills(employee.skills.clone());
            (id.clone(), capacity)
        })
        .collect();

    info!(
        estimated_days,
        available_days = horizon.working_days,
        employees = employees.len(),
        "project duration estimated"
    );
    Ok(ProjectEstimate {
        estimated_days,
        horizon,
        bandwidth,
    })
}

/// Computes bandwidth for the sprint starting at `start`.
///
/// `bandwidth = sprint length - leave days in [start, start + length] - reserved days`.
#[must_use]
pub fn next_sprint_bandwidth(
    employees: &Roster,
    holidays: &HashSet<NaiveDate>,
    start: NaiveDate,
    policy: SprintPolicy,
) -> SprintBandwidth {
    let end = start + Days::new(u64::from(policy.sprint_length_days));
    let length = i64::from(policy.sprint_length_days);
    let reserved = i64::from(policy.reserved_days);

    let bandwidth: BandwidthMap = employees
        .iter()
        .map(|(id, employee)| {
            let leave = employee.leave_days_between(start, end) as i64;
            let capacity = EmployeeCapacity::new(employee.name.clone(), length - leave - reserved);
            (id.clone(), capacity)
        })
        .collect();

    let available_days =
        working_days_in_window(start, policy.sprint_length_days, holidays).len();
    info!(%start, %end, available_days, "next sprint sized");

    SprintBandwidth {
        bandwidth,
        available_days,
        sprint: Sprint::new(1, start, end),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sprintcraft_core::{Employee, EmployeeId};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn roster(employees: Vec<Employee>) -> Roster {
        employees
            .into_iter()
            .map(|employee| (employee.emp_id.clone(), employee))
            .collect()
    }

    #[test]
    fn zero_employees_fails() {
        let stories = [Story::new("Login", "Auth", 3)];
        let result =
            estimate_project_duration(&stories, &Roster::new(), &HashSet::new(), date(2024, 1, 2));
        assert_eq!(result, Err(CapacityError::NoEmployees));
    }

    #[test]
    fn estimated_days_rounds_down() {
        assert_eq!(estimate_working_days(11, 2), Ok(5));
        assert_eq!(estimate_working_days(1, 3), Ok(0));
    }

    #[test]
    fn project_bandwidth_subtracts_leave_inside_horizon() {
        // 20 points over 2 people -> 10 working days from Tue 2024-01-02:
        // 02..05, 08..12, 15 -> cursor 2024-01-16.
        let stories: Vec<Story> = (0..4).map(|i| Story::new(format!("S{i}"), "Core", 5)).collect();
        let employees = roster(vec![
            Employee::new("E1", "Asha", "asha@example.com")
                .with_leave("trip", date(2024, 1, 3))
                .with_leave("trip", date(2024, 1, 16))
                .with_leave("later", date(2024, 2, 1)),
            Employee::new("E2", "Ben", "ben@example.com"),
        ]);

        let estimate =
            estimate_project_duration(&stories, &employees, &HashSet::new(), date(2024, 1, 2))
                .unwrap();

        assert_eq!(estimate.estimated_days, 10);
        assert_eq!(estimate.horizon.end, date(2024, 1, 16));
        let e1 = &estimate.bandwidth[&EmployeeId::new("E1")];
        assert_eq!(e1.remaining_points, 8);
        assert_eq!(e1.name, "Asha");
        assert!(e1.skills.is_some());
        assert_eq!(estimate.bandwidth[&EmployeeId::new("E2")].remaining_points, 10);
    }

    #[test]
    fn project_bandwidth_may_go_negative() {
        let stories = [Story::new("Tiny", "Core", 1)];
        let employees = roster(vec![
            Employee::new("E1", "Asha", "asha@example.com")
                .with_leave("trip", date(2024, 1, 2))
                .with_leave("trip", date(2024, 1, 3)),
        ]);

        let estimate =
            estimate_project_duration(&stories, &employees, &HashSet::new(), date(2024, 1, 2))
                .unwrap();
        // One working day; the horizon end (the cursor day) is inclusive.
        assert_eq!(estimate.horizon.working_days, 1);
        assert_eq!(estimate.horizon.end, date(2024, 1, 3));
        assert_eq!(estimate.bandwidth[&EmployeeId::new("E1")].remaining_points, -1);
    }

    #[test]
    fn holiday_window_spans_twice_the_estimate() {
        let (start, end) = holiday_window(date(2024, 12, 20), 10);
        assert_eq!(start, date(2024, 12, 20));
        assert_eq!(end, date(2025, 1, 9));
    }

    #[test]
    fn next_sprint_without_leave_is_ten() {
        let employees = roster(vec![Employee::new("E1", "Asha", "asha@example.com")]);
        let sized = next_sprint_bandwidth(
            &employees,
            &HashSet::new(),
            date(2024, 1, 2),
            SprintPolicy::default(),
        );

        let e1 = &sized.bandwidth[&EmployeeId::new("E1")];
        assert_eq!(e1.remaining_points, 10);
        assert!(e1.skills.is_none());
        assert_eq!(sized.sprint.name, "Sprint 1");
        assert_eq!(sized.sprint.start_date, date(2024, 1, 2));
        assert_eq!(sized.sprint.end_date, date(2024, 1, 16));
        assert!(sized.sprint.stories.is_empty());
    }

    #[test]
    fn next_sprint_counts_leave_on_both_window_ends() {
        let employees = roster(vec![
            Employee::new("E1", "Asha", "asha@example.com")
                .with_leave("start", date(2024, 1, 2))
                .with_leave("end", date(2024, 1, 16))
                .with_leave("after", date(2024, 1, 17)),
        ]);
        let sized = next_sprint_bandwidth(
            &employees,
            &HashSet::from([date(2024, 1, 1)]),
            date(2024, 1, 2),
            SprintPolicy::default(),
        );
        assert_eq!(sized.bandwidth[&EmployeeId::new("E1")].remaining_points, 8);
        assert_eq!(sized.available_days, 10);
    }
}
