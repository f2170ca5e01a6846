//! The state threaded through a planning run.

use crate::node::PlannerNode;
use chrono::{Days, NaiveDate};
use serde::Serialize;
use sprintcraft_core::{
    BandwidthMap, Epic, ProjectRequest, Roster, Sprint, Story, StoryMap, TaskArea,
};
use sprintcraft_planning::Halt;
use sprintcraft_workflow::{GraphState, Route, StateUpdate};

/// Everything a planning run knows so far.
///
/// Stories live in two places on purpose: `ordered_stories` holds the LLM's
/// drafts before they exist in the tracker, `stories_by_id` holds them keyed
/// by issue key afterwards. Issue creation is the only step that converts
/// one into the other.
#[derive(Debug, Clone, Serialize)]
pub struct PlannerState {
    pub input: ProjectRequest,
    /// The day the run plans from; working days start the day after.
    pub today: NaiveDate,
    /// `None` until the task file has been read.
    pub tasks_by_area: Option<Vec<TaskArea>>,
    pub employees_by_id: Roster,
    pub epics: Vec<Epic>,
    pub ordered_stories: Vec<Story>,
    pub stories_by_id: StoryMap,
    pub employee_bandwidth: BandwidthMap,
    pub estimated_days: Option<u64>,
    pub available_sprint_days: usize,
    pub next_sprint: Option<Sprint>,
    /// Where sprint allocation stopped, if it did not admit every story.
    pub sprint_halt: Option<Halt>,
    /// Stories the tracker accepted into the sprint.
    pub sprint_assigned: Option<usize>,
    pub next: Option<Route<PlannerNode>>,
}

impl PlannerState {
    /// A fresh state for one request.
    #[must_use]
    pub fn new(input: ProjectRequest, today: NaiveDate) -> Self {
        Self {
            input,
            today,
            tasks_by_area: None,
            employees_by_id: Roster::new(),
            epics: Vec::new(),
            ordered_stories: Vec::new(),
            stories_by_id: StoryMap::new(),
            employee_bandwidth: BandwidthMap::new(),
            estimated_days: None,
            available_sprint_days: 0,
            next_sprint: None,
            sprint_halt: None,
            sprint_assigned: None,
            next: None,
        }
    }

    /// The first day that counts as working time.
    #[must_use]
    pub fn planning_start(&self) -> NaiveDate {
        self.today + Days::new(1)
    }
}

/// The fields a step changed. `None` leaves the current value alone.
#[derive(Debug, Default)]
pub struct PlannerUpdate {
    pub tasks_by_area: Option<Vec<TaskArea>>,
    pub employees_by_id: Option<Roster>,
    pub epics: Option<Vec<Epic>>,
    pub ordered_stories: Option<Vec<Story>>,
    pub stories_by_id: Option<StoryMap>,
    pub employee_bandwidth: Option<BandwidthMap>,
    pub estimated_days: Option<u64>,
    pub available_sprint_days: Option<usize>,
    pub next_sprint: Option<Sprint>,
    pub sprint_halt: Option<Option<Halt>>,
    pub sprint_assigned: Option<usize>,
    pub next: Option<Route<PlannerNode>>,
}

impl PlannerUpdate {
    /// An update that only routes to `next`.
    #[must_use]
    pub fn goto(next: impl Into<Route<PlannerNode>>) -> Self {
        Self::routed(next.into())
    }

    /// Sets the routing decision.
    #[must_use]
    pub fn then(mut self, next: impl Into<Route<PlannerNode>>) -> Self {
        self.next = Some(next.into());
        self
    }
}

impl StateUpdate<PlannerNode> for PlannerUpdate {
    fn route(&self) -> Option<Route<PlannerNode>> {
        self.next
    }

    fn routed(route: Route<PlannerNode>) -> Self {
        Self {
            next: Some(route),
            ..Self::default()
        }
    }
}

impl GraphState for PlannerState {
    type Node = PlannerNode;
    type Update = PlannerUpdate;

    fn merge(&mut self, update: PlannerUpdate) {
        if let Some(tasks) = update.tasks_by_area {
            self.tasks_by_area = Some(tasks);
        }
        if let Some(employees) = update.employees_by_id {
            self.employees_by_id = employees;
        }
        if let Some(epics) = update.epics {
            self.epics = epics;
        }
        if let Some(stories) = update.ordered_stories {
            self.ordered_stories = stories;
        }
        if let Some(stories) = update.stories_by_id {
            self.stories_by_id = stories;
        }
        if let Some(bandwidth) = update.employee_bandwidth {
            self.employee_bandwidth = bandwidth;
        }
        if let Some(days) = update.estimated_days {
            self.estimated_days = Some(days);
        }
        if let Some(days) = update.available_sprint_days {
            self.available_sprint_days = days;
        }
        if let Some(sprint) = update.next_sprint {
            self.next_sprint = Some(sprint);
        }
        if let Some(halt) = update.sprint_halt {
            self.sprint_halt = halt;
        }
        if let Some(assigned) = update.sprint_assigned {
            self.sprint_assigned = Some(assigned);
        }
        if let Some(next) = update.next {
            self.next = Some(next);
        }
    }

    fn routing(&self) -> Option<Route<PlannerNode>> {
        self.next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sprintcraft_core::EmployeeCapacity;

    fn state() -> PlannerState {
        PlannerState::new(
            ProjectRequest::new("Atlas", "Internal tooling"),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        )
    }

    #[test]
    fn planning_starts_tomorrow() {
        assert_eq!(
            state().planning_start(),
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
        );
    }

    #[test]
    fn merge_overwrites_only_present_fields() {
        let mut state = state();
        state.epics = vec![Epic::new("Backend", "")];

        let mut bandwidth = BandwidthMap::new();
        bandwidth.insert("E1".into(), EmployeeCapacity::new("Asha", 10));
        state.merge(PlannerUpdate {
            employee_bandwidth: Some(bandwidth),
            ..PlannerUpdate::goto(PlannerNode::OrderStories)
        });

        assert_eq!(state.epics.len(), 1);
        assert_eq!(state.employee_bandwidth.len(), 1);
        assert_eq!(state.routing(), Some(Route::Node(PlannerNode::OrderStories)));
    }

    #[test]
    fn routing_persists_across_route_free_updates() {
        let mut state = state();
        state.merge(PlannerUpdate::goto(Route::End));
        state.merge(PlannerUpdate::default());
        assert_eq!(state.routing(), Some(Route::End));
    }

    #[test]
    fn halt_can_be_cleared() {
        let mut state = state();
        state.merge(PlannerUpdate {
            sprint_halt: Some(None),
            ..PlannerUpdate::default()
        });
        assert!(state.sprint_halt.is_none());
    }
}
