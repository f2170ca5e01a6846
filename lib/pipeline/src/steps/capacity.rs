use crate::error::{capacity_failed, holidays_failed};
use crate::node::PlannerNode;
use crate::state::{PlannerState, PlannerUpdate};
use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use sprintcraft_integration::{HolidaySource, holidays_in_range};
use sprintcraft_planning::{
    SprintPolicy, estimate_project_duration, estimate_working_days, holiday_window,
    next_sprint_bandwidth, working_days_in_window,
};
use sprintcraft_workflow::{Step, StepError};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;

/// Public holidays for the planning country.
pub(crate) struct Calendar {
    source: Arc<dyn HolidaySource>,
    country_code: String,
}

impl Calendar {
    pub(crate) fn new(source: Arc<dyn HolidaySource>, country_code: impl Into<String>) -> Self {
        Self {
            source,
            country_code: country_code.into(),
        }
    }

    async fn holidays(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<HashSet<NaiveDate>, StepError> {
        holidays_in_range(self.source.as_ref(), &self.country_code, start, end)
            .await
            .map_err(holidays_failed)
    }
}

/// Estimates the project duration and everyone's bandwidth over it.
pub struct EstimateSprintCount {
    calendar: Calendar,
    policy: SprintPolicy,
}

impl EstimateSprintCount {
    #[must_use]
    pub fn new(
        holidays: Arc<dyn HolidaySource>,
        country_code: impl Into<String>,
        policy: SprintPolicy,
    ) -> Self {
        Self {
            calendar: Calendar::new(holidays, country_code),
            policy,
        }
    }
}

#[async_trait]
impl Step<PlannerState> for EstimateSprintCount {
    async fn run(&self, state: &PlannerState) -> Result<PlannerUpdate, StepError> {
        let start = state.planning_start();
        let total_points: u64 = state
            .ordered_stories
            .iter()
            .map(|story| u64::from(story.estimate))
            .sum();
        let estimated_days = estimate_working_days(total_points, state.employees_by_id.len())
            .map_err(|e| capacity_failed(&e))?;

        // The holiday window also covers the first sprint, whose weekday
        // slots are counted below.
        let (from, project_end) = holiday_window(start, estimated_days);
        let sprint_end = start + Days::new(u64::from(self.policy.sprint_length_days));
        let holidays = self
            .calendar
            .holidays(from, project_end.max(sprint_end))
            .await?;

        let estimate = estimate_project_duration(
            &state.ordered_stories,
            &state.employees_by_id,
            &holidays,
            start,
        )
        .map_err(|e| capacity_failed(&e))?;
        let available_sprint_days =
            working_days_in_window(start, self.policy.sprint_length_days, &holidays).len();

        info!(
            total_points,
            estimated_days,
            horizon_end = %estimate.horizon.end,
            available_sprint_days,
            "sprint count estimated"
        );
        Ok(PlannerUpdate {
            employee_bandwidth: Some(estimate.bandwidth),
            estimated_days: Some(estimate.estimated_days),
            available_sprint_days: Some(available_sprint_days),
            ..PlannerUpdate::goto(PlannerNode::CreateJiraIssues)
        })
    }
}

/// Sizes the next sprint and replaces the bandwidth table with its budget.
pub struct EmployeeBandwidthForSprint {
    calendar: Calendar,
    policy: SprintPolicy,
}

impl EmployeeBandwidthForSprint {
    #[must_use]
    pub fn new(
        holidays: Arc<dyn HolidaySource>,
        country_code: impl Into<String>,
        policy: SprintPolicy,
    ) -> Self {
        Self {
            calendar: Calendar::new(holidays, country_code),
            policy,
        }
    }
}

#[async_trait]
impl Step<PlannerState> for EmployeeBandwidthForSprint {
    async fn run(&self, state: &PlannerState) -> Result<PlannerUpdate, StepError> {
        let start = state.planning_start();
        let end = start + Days::new(u64::from(self.policy.sprint_length_days));
        let holidays = self.calendar.holidays(start, end).await?;

        let sized = next_sprint_bandwidth(&state.employees_by_id, &holidays, start, self.policy);
        Ok(PlannerUpdate {
            employee_bandwidth: Some(sized.bandwidth),
            available_sprint_days: Some(sized.available_days),
            next_sprint: Some(sized.sprint),
            ..PlannerUpdate::goto(PlannerNode::PlanNextSprint)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rootcause::prelude::Report;
    use sprintcraft_core::{Employee, EmployeeId, ProjectRequest, Story};
    use sprintcraft_integration::{HolidayError, StaticHolidays};
    use sprintcraft_workflow::Route;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Planning from 2024-01-01 starts on Tuesday 2024-01-02.
    fn state() -> PlannerState {
        let mut state = PlannerState::new(ProjectRequest::new("Atlas", ""), date(2024, 1, 1));
        for employee in [
            Employee::new("E1", "Asha", "asha@example.com").with_leave("trip", date(2024, 1, 3)),
            Employee::new("E2", "Ravi", "ravi@example.com"),
        ] {
            state.employees_by_id.insert(employee.emp_id.clone(), employee);
        }
        state.ordered_stories = vec![
            Story::new("Schema", "Backend", 5),
            Story::new("API", "Backend", 5),
        ];
        state
    }

    fn holidays() -> Arc<dyn HolidaySource> {
        Arc::new(StaticHolidays::new([date(2024, 1, 1), date(2024, 1, 15)]))
    }

    struct Down;

    #[async_trait]
    impl HolidaySource for Down {
        async fn holidays(
            &self,
            _country: &str,
            _year: i32,
        ) -> Result<Vec<NaiveDate>, Report<HolidayError>> {
            Err(HolidayError::UnexpectedStatus {
                status: 503,
                body: "maintenance".to_string(),
            }
            .into())
        }
    }

    fn assert_holiday_outage(err: StepError) {
        match err {
            StepError::ExternalService { service, message } => {
                assert_eq!(service, "holidays");
                assert!(message.contains("HTTP 503"), "{message}");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn estimate_counts_horizon_and_sprint_slots() {
        let step = EstimateSprintCount::new(holidays(), "US", SprintPolicy::default());

        let update = step.run(&state()).await.unwrap();

        assert_eq!(update.estimated_days, Some(5));
        let bandwidth = update.employee_bandwidth.unwrap();
        assert_eq!(bandwidth[&EmployeeId::new("E1")].remaining_points, 4);
        assert_eq!(bandwidth[&EmployeeId::new("E2")].remaining_points, 5);
        assert!(bandwidth[&EmployeeId::new("E1")].skills.is_some());
        // Ten weekdays from 2024-01-02, minus the 15th.
        assert_eq!(update.available_sprint_days, Some(9));
        assert_eq!(update.next, Some(Route::Node(PlannerNode::CreateJiraIssues)));
    }

    #[tokio::test]
    async fn empty_roster_fails_estimation() {
        let mut state = state();
        state.employees_by_id.clear();
        let step = EstimateSprintCount::new(holidays(), "US", SprintPolicy::default());

        let err = step.run(&state).await.unwrap_err();
        assert!(matches!(err, StepError::InvalidInput { .. }));
    }

    #[tokio::test]
    async fn next_sprint_budget_replaces_bandwidth() {
        let step = EmployeeBandwidthForSprint::new(holidays(), "US", SprintPolicy::default());

        let update = step.run(&state()).await.unwrap();

        let bandwidth = update.employee_bandwidth.unwrap();
        assert_eq!(bandwidth[&EmployeeId::new("E1")].remaining_points, 9);
        assert_eq!(bandwidth[&EmployeeId::new("E2")].remaining_points, 10);
        assert!(bandwidth[&EmployeeId::new("E2")].skills.is_none());

        let sprint = update.next_sprint.unwrap();
        assert_eq!(sprint.name, "Sprint 1");
        assert_eq!(sprint.start_date, date(2024, 1, 2));
        assert_eq!(sprint.end_date, date(2024, 1, 16));
        assert_eq!(update.available_sprint_days, Some(9));
    }

    #[tokio::test]
    async fn holiday_outage_fails_estimation() {
        let step = EstimateSprintCount::new(Arc::new(Down), "US", SprintPolicy::default());

        assert_holiday_outage(step.run(&state()).await.unwrap_err());
    }

    #[tokio::test]
    async fn holiday_outage_fails_sprint_sizing() {
        let step = EmployeeBandwidthForSprint::new(Arc::new(Down), "US", SprintPolicy::default());

        assert_holiday_outage(step.run(&state()).await.unwrap_err());
    }
}
