//! HTTP handlers.

use crate::error::ApiError;
use axum::{
    Json, Router,
    extract::State,
    response::Html,
    routing::{get, post},
};
use serde::Serialize;
use sprintcraft_core::{BandwidthMap, Epic, ProjectRequest, Sprint, StoryMap};
use sprintcraft_pipeline::{Planner, PlannerState};
use sprintcraft_workflow::{ExecutionState, RunOutcome};
use std::sync::Arc;
use tokio::sync::watch;
use tower_http::trace::TraceLayer;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    planner: Arc<Planner>,
    shutdown: watch::Receiver<bool>,
}

impl AppState {
    /// `shutdown` flips to `true` once the server starts draining.
    #[must_use]
    pub fn new(planner: Planner, shutdown: watch::Receiver<bool>) -> Self {
        Self {
            planner: Arc::new(planner),
            shutdown,
        }
    }
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/invoke", post(invoke))
        .route("/graph", get(graph_page))
        .route("/graph.dot", get(graph_dot))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// What a finished planning run reports back.
#[derive(Debug, Serialize)]
pub struct PlanSummary {
    pub run_id: String,
    pub status: ExecutionState,
    pub visited: Vec<String>,
    pub epics: Vec<Epic>,
    pub stories: StoryMap,
    pub bandwidth: BandwidthMap,
    pub sprint: Option<Sprint>,
    /// Stories that made it onto the tracker sprint.
    pub sprint_assigned: Option<usize>,
}

impl From<RunOutcome<PlannerState>> for PlanSummary {
    fn from(outcome: RunOutcome<PlannerState>) -> Self {
        let RunOutcome { state, run } = outcome;
        Self {
            run_id: run.id.to_string(),
            status: run.state,
            visited: run.path().into_iter().map(str::to_string).collect(),
            epics: state.epics,
            stories: state.stories_by_id,
            bandwidth: state.employee_bandwidth,
            sprint: state.next_sprint,
            sprint_assigned: state.sprint_assigned,
        }
    }
}

/// Resolves once shutdown is signalled. Never resolves if the sender is gone.
async fn stopping(mut shutdown: watch::Receiver<bool>) {
    let signalled = shutdown.wait_for(|stopping| *stopping).await.is_ok();
    if !signalled {
        std::future::pending::<()>().await;
    }
}

async fn invoke(
    State(state): State<AppState>,
    Json(request): Json<ProjectRequest>,
) -> Result<Json<PlanSummary>, ApiError> {
    let today = chrono::Local::now().date_naive();
    tokio::select! {
        biased;
        () = stopping(state.shutdown.clone()) => Err(ApiError::ShuttingDown),
        outcome = state.planner.plan(request, today) => Ok(Json(PlanSummary::from(outcome?))),
    }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

async fn graph_page(State(state): State<AppState>) -> Html<String> {
    let diagram = escape_html(&state.planner.graph().to_mermaid());
    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8"/>
<title>sprintcraft planner graph</title>
</head>
<body>
<pre class="mermaid">
{diagram}
</pre>
<script type="module">
import mermaid from "https://cdn.jsdelivr.net/npm/mermaid@11/dist/mermaid.esm.min.mjs";
mermaid.initialize({{ startOnLoad: true }});
</script>
</body>
</html>
"#
    ))
}

async fn graph_dot(State(state): State<AppState>) -> String {
    state.planner.graph().to_dot()
}

async fn health() -> &'static str {
    "ok"
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
    };
    use chrono::NaiveDate;
    use serde_json::{Value as JsonValue, json};
    use sprintcraft_ai::{CompletionError, LlmError, LlmRequest, StructuredCompleter};
    use sprintcraft_core::IssueKey;
    use sprintcraft_integration::{IssueTracker, RetryPolicy, StaticHolidays, TrackerError};
    use sprintcraft_pipeline::{Collaborators, LlmAssignmentAdvisor, PlannerConfig};
    use std::io::Write;
    use std::time::Duration;
    use tempfile::NamedTempFile;
    use tower::ServiceExt;

    /// A model that is always down.
    struct Unavailable;

    #[async_trait]
    impl StructuredCompleter for Unavailable {
        async fn complete(
            &self,
            _request: LlmRequest,
        ) -> Result<JsonValue, rootcause::prelude::Report<CompletionError>> {
            Err(CompletionError::Provider {
                source: LlmError::RequestFailed {
                    reason: "connection refused".to_string(),
                },
            }
            .into())
        }
    }

    /// A tracker the tests never reach.
    struct Untouched;

    #[async_trait]
    impl IssueTracker for Untouched {
        async fn create_epic(&self, _title: &str, _description: &str) -> Option<IssueKey> {
            None
        }

        async fn create_story(
            &self,
            _title: &str,
            _description: &str,
            _parent: &IssueKey,
        ) -> Option<IssueKey> {
            None
        }

        async fn assign_story(&self, _key: &IssueKey, _email: &str) -> bool {
            false
        }

        async fn create_sprint(
            &self,
            _name: &str,
            _start: NaiveDate,
            _end: NaiveDate,
        ) -> Result<u64, rootcause::prelude::Report<TrackerError>> {
            Err(TrackerError::UnexpectedStatus {
                operation: "create_sprint",
                status: 500,
                body: String::new(),
            }
            .into())
        }

        async fn assign_stories_to_sprint(&self, _sprint_id: u64, _keys: &[IssueKey]) -> usize {
            0
        }
    }

    fn csv_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    struct Fixture {
        app: Router,
        shutdown: watch::Sender<bool>,
        _employees: NamedTempFile,
    }

    fn fixture() -> Fixture {
        let employees = csv_file(
            "Roster,,,,\n\
             Employee id,name,Email id,Skills,Leave plan\n\
             E1,Asha,asha@example.com,\"[Rust,Advanced]\",\n",
        );
        let config = PlannerConfig {
            employees_csv: employees.path().display().to_string(),
            tasks_csv: "/nonexistent/tasks.csv".to_string(),
            ..PlannerConfig::default()
        };
        let completer: Arc<dyn StructuredCompleter> = Arc::new(Unavailable);
        let collaborators = Collaborators {
            completer: completer.clone(),
            advisor: Arc::new(LlmAssignmentAdvisor::new(completer)),
            tracker: Arc::new(Untouched),
            holidays: Arc::new(StaticHolidays::new([])),
            country_code: "US".to_string(),
            story_retry: RetryPolicy::new(1, Duration::ZERO),
        };
        let planner = Planner::new(&collaborators, &config).unwrap();
        let (shutdown, receiver) = watch::channel(false);
        Fixture {
            app: router(AppState::new(planner, receiver)),
            shutdown,
            _employees: employees,
        }
    }

    fn invoke_request(body: &JsonValue) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/invoke")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> JsonValue {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn health_is_ok() {
        let response = fixture()
            .app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "ok");
    }

    #[tokio::test]
    async fn graph_renders_as_dot_and_mermaid() {
        let Fixture { app, .. } = fixture();

        let dot = app
            .clone()
            .oneshot(Request::get("/graph.dot").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(dot.status(), StatusCode::OK);
        let dot = body_text(dot).await;
        assert!(dot.starts_with("digraph"));
        assert!(dot.contains("create_and_update_sprint"));

        let page = app
            .oneshot(Request::get("/graph").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let page = body_text(page).await;
        assert!(page.contains("class=\"mermaid\""));
        assert!(page.contains("data_manager"));
    }

    #[tokio::test]
    async fn missing_task_file_is_a_bad_request() {
        let response = fixture()
            .app
            .oneshot(invoke_request(&json!({
                "project_name": "Atlas",
                "project_desc": "Sprint planning",
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["node"], "load_input_data");
    }

    #[tokio::test]
    async fn model_outage_is_a_bad_gateway() {
        let tasks = csv_file("Tasks,\nTask,Sub-task\nBackend,Design schema\n");
        let response = fixture()
            .app
            .oneshot(invoke_request(&json!({
                "project_name": "Atlas",
                "csv_path": tasks.path().display().to_string(),
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = body_json(response).await;
        assert_eq!(body["node"], "epic_and_stories");
    }

    #[tokio::test]
    async fn runs_are_refused_once_shutdown_fires() {
        let Fixture { app, shutdown, .. } = fixture();
        shutdown.send(true).unwrap();

        let tasks = csv_file("Tasks,\nTask,Sub-task\nBackend,Design schema\n");
        let response = app
            .oneshot(invoke_request(&json!({
                "project_name": "Atlas",
                "csv_path": tasks.path().display().to_string(),
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
