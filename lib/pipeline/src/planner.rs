//! Wiring of the planning graph.
//!
//! ```text
//! data_manager ─▶ load_input_data ─▶ data_manager ─▶ load_employee_data ─▶ data_manager
//!   ─▶ epic_and_stories ─▶ utils_manager ─▶ estimate_sprint_count ─▶ jira_manager
//!   ─▶ create_jira_issues ─▶ agent_manager ─▶ order_stories ─▶ agent_manager
//!   ─▶ story_assignee ─▶ jira_manager ─▶ assign_story_jira ─▶ utils_manager
//!   ─▶ employee_bandwidth_for_sprint ─▶ agent_manager ─▶ plan_next_sprint
//!   ─▶ jira_manager ─▶ create_and_update_sprint ─▶ END
//! ```

use crate::assignment::AssignmentAdvisor;
use crate::config::PlannerConfig;
use crate::node::PlannerNode;
use crate::state::PlannerState;
use crate::steps::{self, data_manager, plan_next_sprint};
use chrono::NaiveDate;
use sprintcraft_ai::StructuredCompleter;
use sprintcraft_core::ProjectRequest;
use sprintcraft_integration::{HolidaySource, IssueTracker, RetryPolicy};
use sprintcraft_workflow::{EngineError, Route, Router, RunOutcome, WorkflowEngine, WorkflowGraph};
use std::sync::Arc;
use tracing::{info, instrument};

/// The external services a planning run talks to, and how it talks to them.
#[derive(Clone)]
pub struct Collaborators {
    pub completer: Arc<dyn StructuredCompleter>,
    pub advisor: Arc<dyn AssignmentAdvisor>,
    pub tracker: Arc<dyn IssueTracker>,
    pub holidays: Arc<dyn HolidaySource>,
    /// Country whose public holidays are excluded from working days.
    pub country_code: String,
    /// Retry policy for story creation.
    pub story_retry: RetryPolicy,
}

/// Registers every node and edge of the planning graph.
///
/// # Errors
///
/// Returns an error if the graph is incomplete, which is a programming
/// error rather than a runtime condition.
pub fn build_planner_engine(
    collaborators: &Collaborators,
    config: &PlannerConfig,
) -> Result<WorkflowEngine<PlannerState>, EngineError> {
    use PlannerNode::*;

    let policy = config.sprint_policy();
    let mut engine = WorkflowEngine::new().with_step_limit(config.step_limit);

    engine.register_fn(DataManager, data_manager)?;
    engine.register(UtilsManager, Router)?;
    engine.register(JiraManager, Router)?;
    engine.register(AgentManager, Router)?;

    engine.register(LoadInputData, steps::LoadInputData::new(config))?;
    engine.register(LoadEmployeeData, steps::LoadEmployeeData::new(config))?;
    engine.register(
        EpicAndStories,
        steps::EpicAndStories::new(collaborators.completer.clone(), config.mode),
    )?;
    engine.register(
        EstimateSprintCount,
        steps::EstimateSprintCount::new(
            collaborators.holidays.clone(),
            collaborators.country_code.clone(),
            policy,
        ),
    )?;
    engine.register(
        CreateJiraIssues,
        steps::CreateJiraIssues::new(collaborators.tracker.clone(), collaborators.story_retry),
    )?;
    engine.register(
        OrderStories,
        steps::OrderStories::new(collaborators.completer.clone()),
    )?;
    engine.register(
        StoryAssignee,
        steps::StoryAssignee::new(collaborators.advisor.clone(), config.assignment_batch_size),
    )?;
    engine.register(
        AssignStoryJira,
        steps::AssignStoryJira::new(collaborators.tracker.clone()),
    )?;
    engine.register(
        EmployeeBandwidthForSprint,
        steps::EmployeeBandwidthForSprint::new(
            collaborators.holidays.clone(),
            collaborators.country_code.clone(),
            policy,
        ),
    )?;
    engine.register_fn(PlanNextSprint, plan_next_sprint)?;
    engine.register(
        CreateAndUpdateSprint,
        steps::CreateAndUpdateSprint::new(collaborators.tracker.clone()),
    )?;

    for (from, to) in [
        (LoadInputData, DataManager),
        (LoadEmployeeData, DataManager),
        (EpicAndStories, UtilsManager),
        (EstimateSprintCount, JiraManager),
        (CreateJiraIssues, AgentManager),
        (OrderStories, AgentManager),
        (EmployeeBandwidthForSprint, AgentManager),
        (StoryAssignee, JiraManager),
        (AssignStoryJira, UtilsManager),
        (PlanNextSprint, JiraManager),
    ] {
        engine.add_static_edge(from, to)?;
    }
    engine.add_static_edge(CreateAndUpdateSprint, Route::End)?;

    engine.declare_routes(
        DataManager,
        &[
            LoadInputData.into(),
            LoadEmployeeData.into(),
            EpicAndStories.into(),
        ],
    )?;
    engine.declare_routes(
        UtilsManager,
        &[EstimateSprintCount.into(), EmployeeBandwidthForSprint.into()],
    )?;
    engine.declare_routes(
        JiraManager,
        &[
            CreateJiraIssues.into(),
            AssignStoryJira.into(),
            CreateAndUpdateSprint.into(),
        ],
    )?;
    engine.declare_routes(
        AgentManager,
        &[OrderStories.into(), StoryAssignee.into(), PlanNextSprint.into()],
    )?;

    engine.set_entry(DataManager)?;
    engine.validate()?;
    Ok(engine)
}

/// A validated planning graph, reusable across requests.
pub struct Planner {
    engine: WorkflowEngine<PlannerState>,
}

impl Planner {
    /// Builds and validates the graph.
    ///
    /// # Errors
    ///
    /// See [`build_planner_engine`].
    pub fn new(collaborators: &Collaborators, config: &PlannerConfig) -> Result<Self, EngineError> {
        let engine = build_planner_engine(collaborators, config)?;
        info!(
            nodes = engine.graph().node_count(),
            edges = engine.graph().edge_count(),
            "planner graph built"
        );
        Ok(Self { engine })
    }

    /// Plans one project, treating `today` as the current date.
    ///
    /// # Errors
    ///
    /// Returns the first step failure, wrapped with the node it came from.
    #[instrument(skip_all, fields(project = %request.project_name))]
    pub async fn plan(
        &self,
        request: ProjectRequest,
        today: NaiveDate,
    ) -> Result<RunOutcome<PlannerState>, EngineError> {
        self.engine
            .run(PlannerState::new(request, today), PlannerNode::DataManager)
            .await
    }

    #[must_use]
    pub fn graph(&self) -> &WorkflowGraph<PlannerNode> {
        self.engine.graph()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assignment::LlmAssignmentAdvisor;
    use async_trait::async_trait;
    use rootcause::prelude::Report;
    use serde_json::{Value as JsonValue, json};
    use sprintcraft_ai::{CompletionError, LlmRequest};
    use sprintcraft_core::{EmployeeId, IssueKey};
    use sprintcraft_integration::{StaticHolidays, TrackerError};
    use sprintcraft_workflow::{ExecutionState, NodeName, StepError};
    use std::io::Write;
    use std::sync::Mutex;
    use std::time::Duration;
    use tempfile::NamedTempFile;

    /// Completer scripted per schema name. The story order moves the
    /// frontend story first so the test can tell the ordering step ran.
    struct ScriptedCompleter;

    #[async_trait]
    impl StructuredCompleter for ScriptedCompleter {
        async fn complete(
            &self,
            request: LlmRequest,
        ) -> Result<JsonValue, Report<CompletionError>> {
            let schema = request.output.map(|output| output.name).unwrap_or_default();
            Ok(match schema.as_str() {
                "epic_list" => json!({"epics": [
                    {"title": "Backend", "description": "Server work"},
                    {"title": "Frontend", "description": "Client work"}
                ]}),
                "story_list" if request.prompt.contains("Epic: Backend") => json!({"stories": [
                    {"title": "Schema", "description": "Tables", "epic": "Backend", "estimate": 3},
                    {"title": "API", "description": "Endpoints", "epic": "Backend", "estimate": 5}
                ]}),
                "story_list" => json!({"stories": [
                    {"title": "Login", "description": "Form", "epic": "Frontend", "estimate": 4}
                ]}),
                "story_order" => json!({"stories": ["AI1-3", "AI1-1", "AI1-2", "AI1-404"]}),
                "story_employee_mapping" => json!({"story_employee_mapping": {
                    "AI1-1": "E1", "AI1-2": "E1", "AI1-3": "E2"
                }}),
                other => json!({"unexpected": other}),
            })
        }
    }

    /// Tracker numbering issues sequentially and logging every call.
    #[derive(Default)]
    struct RecordingTracker {
        next_key: Mutex<u32>,
        calls: Mutex<Vec<String>>,
    }

    impl RecordingTracker {
        fn key(&self) -> IssueKey {
            let mut next = self.next_key.lock().unwrap();
            *next += 1;
            IssueKey::new(format!("AI1-{next}"))
        }
    }

    #[async_trait]
    impl IssueTracker for RecordingTracker {
        async fn create_epic(&self, title: &str, _description: &str) -> Option<IssueKey> {
            self.calls.lock().unwrap().push(format!("epic {title}"));
            Some(IssueKey::new(format!("EPIC-{title}")))
        }

        async fn create_story(
            &self,
            title: &str,
            _description: &str,
            _parent: &IssueKey,
        ) -> Option<IssueKey> {
            let key = self.key();
            self.calls.lock().unwrap().push(format!("story {title} {key}"));
            Some(key)
        }

        async fn assign_story(&self, key: &IssueKey, email: &str) -> bool {
            self.calls.lock().unwrap().push(format!("assign {key} {email}"));
            true
        }

        async fn create_sprint(
            &self,
            name: &str,
            start: NaiveDate,
            end: NaiveDate,
        ) -> Result<u64, Report<TrackerError>> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("sprint {name} {start} {end}"));
            Ok(7)
        }

        async fn assign_stories_to_sprint(&self, sprint_id: u64, keys: &[IssueKey]) -> usize {
            let keys: Vec<&str> = keys.iter().map(IssueKey::as_str).collect();
            self.calls
                .lock()
                .unwrap()
                .push(format!("fill {sprint_id} {}", keys.join(",")));
            keys.len()
        }
    }

    struct Fixture {
        _tasks: NamedTempFile,
        _employees: NamedTempFile,
        config: PlannerConfig,
        tracker: Arc<RecordingTracker>,
        collaborators: Collaborators,
    }

    fn csv(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn fixture() -> Fixture {
        let tasks = csv(
            "Atlas plan,\n\
             Task,Sub-task\n\
             Backend,Design schema\n\
             Backend,Expose API\n\
             Frontend,Login page\n",
        );
        let employees = csv(
            "Atlas team,,,,\n\
             Employee id,name,Email id,Skills,Leave plan\n\
             E1,Asha,asha@example.com,\"[Rust, Expert]\",\"[Trip, 2024-01-03]\"\n\
             E2,Ravi,ravi@example.com,\"[TypeScript, Intermediate]\",\n",
        );
        let config = PlannerConfig {
            tasks_csv: tasks.path().display().to_string(),
            employees_csv: employees.path().display().to_string(),
            ..PlannerConfig::default()
        };

        let completer: Arc<dyn StructuredCompleter> = Arc::new(ScriptedCompleter);
        let tracker = Arc::new(RecordingTracker::default());
        let collaborators = Collaborators {
            advisor: Arc::new(LlmAssignmentAdvisor::new(completer.clone())),
            completer,
            tracker: tracker.clone(),
            holidays: Arc::new(StaticHolidays::new([
                NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
            ])),
            country_code: "US".to_string(),
            story_retry: RetryPolicy::new(2, Duration::from_millis(1)),
        };

        Fixture {
            _tasks: tasks,
            _employees: employees,
            config,
            tracker,
            collaborators,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    #[tokio::test]
    async fn full_run_visits_every_node_in_order() {
        let fixture = fixture();
        let planner = Planner::new(&fixture.collaborators, &fixture.config).unwrap();

        let outcome = planner
            .plan(ProjectRequest::new("Atlas", "Internal tooling"), today())
            .await
            .unwrap();

        assert_eq!(outcome.run.state, ExecutionState::Completed);
        assert_eq!(
            outcome.run.path(),
            vec![
                "data_manager",
                "load_input_data",
                "data_manager",
                "load_employee_data",
                "data_manager",
                "epic_and_stories",
                "utils_manager",
                "estimate_sprint_count",
                "jira_manager",
                "create_jira_issues",
                "agent_manager",
                "order_stories",
                "agent_manager",
                "story_assignee",
                "jira_manager",
                "assign_story_jira",
                "utils_manager",
                "employee_bandwidth_for_sprint",
                "agent_manager",
                "plan_next_sprint",
                "jira_manager",
                "create_and_update_sprint",
            ]
        );

        let state = outcome.state;
        assert_eq!(state.next, Some(Route::End));
        // 12 points over 2 people.
        assert_eq!(state.estimated_days, Some(6));
        // The LLM order, minus the unknown key.
        let order: Vec<&str> = state.stories_by_id.keys().map(IssueKey::as_str).collect();
        assert_eq!(order, vec!["AI1-3", "AI1-1", "AI1-2"]);

        // E1: 14 - 1 leave - 4 reserved = 9, takes Schema (3) then API (5).
        // E2: 10, takes Login (4).
        let sprint = state.next_sprint.unwrap();
        assert_eq!(sprint.external_id, Some(7));
        assert_eq!(sprint.stories.len(), 3);
        assert_eq!(state.sprint_assigned, Some(3));
        assert!(state.sprint_halt.is_none());
        assert_eq!(state.employee_bandwidth[&EmployeeId::new("E1")].remaining_points, 1);
        assert_eq!(state.employee_bandwidth[&EmployeeId::new("E2")].remaining_points, 6);

        let calls = fixture.tracker.calls.lock().unwrap();
        assert_eq!(calls.first().map(String::as_str), Some("epic Backend"));
        assert!(calls.contains(&"assign AI1-3 ravi@example.com".to_string()));
        assert!(calls.contains(&"sprint Sprint 1 2024-01-02 2024-01-16".to_string()));
        assert_eq!(calls.last().map(String::as_str), Some("fill 7 AI1-3,AI1-1,AI1-2"));
    }

    #[tokio::test]
    async fn collaborator_failure_names_the_node() {
        let mut fixture = fixture();
        fixture.config.employees_csv = "/nonexistent/employees.csv".to_string();
        let planner = Planner::new(&fixture.collaborators, &fixture.config).unwrap();

        let err = planner
            .plan(ProjectRequest::new("Atlas", ""), today())
            .await
            .unwrap_err();

        match err {
            EngineError::StepFailed { node, source } => {
                assert_eq!(node, "load_employee_data");
                assert!(matches!(source, StepError::InvalidInput { .. }));
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(fixture.tracker.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn graph_renders_every_route() {
        let fixture = fixture();
        let planner = Planner::new(&fixture.collaborators, &fixture.config).unwrap();

        let mermaid = planner.graph().to_mermaid();
        assert!(mermaid.contains("create_and_update_sprint"));
        assert!(mermaid.contains("employee_bandwidth_for_sprint"));
        assert_eq!(planner.graph().node_count(), PlannerNode::all().len());
    }
}
