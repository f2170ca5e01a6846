//! Jira Cloud client.
//!
//! Authenticates with Basic auth (`email:api_token`), creates issues through
//! the v3 REST API with Atlassian Document Format descriptions, and manages
//! sprints through the Agile API.

use crate::error::TrackerError;
use crate::retry::RetryPolicy;
use crate::tracker::IssueTracker;
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::NaiveDate;
use reqwest::{Client, StatusCode};
use rootcause::prelude::Report;
use serde::{Deserialize, Serialize};
use serde_json::{Value as JsonValue, json};
use sprintcraft_core::IssueKey;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

fn default_project_key() -> String {
    "AI1".to_string()
}

fn default_board_id() -> u64 {
    2
}

fn default_sprint_field() -> String {
    "customfield_10020".to_string()
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    2000
}

/// Jira connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JiraConfig {
    /// Site root, e.g. `https://example.atlassian.net`.
    #[serde(default)]
    pub site_url: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub api_token: String,
    #[serde(default = "default_project_key")]
    pub project_key: String,
    /// Board new sprints are created on.
    #[serde(default = "default_board_id")]
    pub board_id: u64,
    /// Custom field holding an issue's sprint.
    #[serde(default = "default_sprint_field")]
    pub sprint_field: String,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl Default for JiraConfig {
    fn default() -> Self {
        Self {
            site_url: String::new(),
            email: String::new(),
            api_token: String::new(),
            project_key: default_project_key(),
            board_id: default_board_id(),
            sprint_field: default_sprint_field(),
            max_attempts: default_max_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

impl JiraConfig {
    /// Retry policy for story creation.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_millis(self.retry_delay_ms))
    }
}

/// A single-paragraph Atlassian Document Format body.
fn adf_paragraph(text: &str) -> JsonValue {
    json!({
        "type": "doc",
        "version": 1,
        "content": [{
            "type": "paragraph",
            "content": [{"type": "text", "text": text}]
        }]
    })
}

#[derive(Debug, Deserialize)]
struct CreatedIssue {
    key: IssueKey,
}

#[derive(Debug, Deserialize)]
struct JiraUser {
    #[serde(rename = "accountId")]
    account_id: String,
}

#[derive(Debug, Deserialize)]
struct CreatedSprint {
    id: u64,
}

/// Jira REST client.
#[derive(Clone)]
pub struct JiraClient {
    client: Client,
    config: JiraConfig,
    authorization: String,
}

impl JiraClient {
    /// Creates a client.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the site URL is empty or the HTTP client
    /// cannot be built.
    pub fn new(config: JiraConfig) -> Result<Self, Report<TrackerError>> {
        if config.site_url.trim().is_empty() {
            return Err(TrackerError::InvalidConfig {
                reason: "site_url is empty".to_string(),
            }
            .into());
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| TrackerError::InvalidConfig {
                reason: e.to_string(),
            })?;
        let authorization = basic_auth(&config.email, &config.api_token);
        Ok(Self {
            client,
            config,
            authorization,
        })
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &JiraConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.site_url.trim_end_matches('/'))
    }

    fn issue_payload(
        &self,
        title: &str,
        description: &str,
        issue_type: &str,
        parent: Option<&IssueKey>,
    ) -> JsonValue {
        let mut fields = json!({
            "project": {"key": self.config.project_key},
            "summary": title,
            "description": adf_paragraph(description),
            "issuetype": {"name": issue_type},
        });
        if let (Some(parent), Some(map)) = (parent, fields.as_object_mut()) {
            map.insert("parent".to_string(), json!({"key": parent}));
        }
        json!({"fields": fields})
    }

    fn sprint_payload(&self, name: &str, start: NaiveDate, end: NaiveDate) -> JsonValue {
        json!({
            "name": name,
            "startDate": start.to_string(),
            "endDate": end.to_string(),
            "originBoardId": self.config.board_id,
        })
    }

    async fn send(
        &self,
        operation: &'static str,
        request: reqwest::RequestBuilder,
        expected: StatusCode,
    ) -> Result<reqwest::Response, TrackerError> {
        let response = request
            .header(reqwest::header::AUTHORIZATION, &self.authorization)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| TrackerError::Http {
                operation,
                reason: e.to_string(),
            })?;

        let status = response.status();
        if status != expected {
            let body = response.text().await.unwrap_or_default();
            return Err(TrackerError::UnexpectedStatus {
                operation,
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn create_issue(
        &self,
        operation: &'static str,
        payload: JsonValue,
    ) -> Result<IssueKey, TrackerError> {
        let request = self.client.post(self.url("/rest/api/3/issue")).json(&payload);
        let response = self.send(operation, request, StatusCode::CREATED).await?;
        let created: CreatedIssue =
            response
                .json()
                .await
                .map_err(|_| TrackerError::MissingField {
                    operation,
                    field: "key",
                })?;
        Ok(created.key)
    }

    async fn account_id(&self, email: &str) -> Result<String, TrackerError> {
        let request = self
            .client
            .get(self.url("/rest/api/3/user/search"))
            .query(&[("query", email)]);
        let response = self.send("user_search", request, StatusCode::OK).await?;
        let users: Vec<JiraUser> = response.json().await.map_err(|_| TrackerError::MissingField {
            operation: "user_search",
            field: "accountId",
        })?;
        users
            .into_iter()
            .next()
            .map(|user| user.account_id)
            .ok_or(TrackerError::MissingField {
                operation: "user_search",
                field: "accountId",
            })
    }

    async fn assign(&self, key: &IssueKey, email: &str) -> Result<(), TrackerError> {
        let account_id = self.account_id(email).await?;
        let request = self
            .client
            .put(self.url(&format!("/rest/api/3/issue/{key}/assignee")))
            .json(&json!({"accountId": account_id}));
        self.send("assign_story", request, StatusCode::NO_CONTENT).await?;
        Ok(())
    }

    async fn move_to_sprint(&self, sprint_id: u64, key: &IssueKey) -> Result<(), TrackerError> {
        let mut fields = serde_json::Map::new();
        fields.insert(self.config.sprint_field.clone(), json!(sprint_id));
        let request = self
            .client
            .put(self.url(&format!("/rest/api/2/issue/{key}")))
            .json(&json!({"fields": fields}));
        self.send("assign_sprint", request, StatusCode::NO_CONTENT).await?;
        Ok(())
    }
}

/// Builds the `Authorization` header value for Basic auth.
fn basic_auth(email: &str, api_token: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{email}:{api_token}")))
}

#[async_trait]
impl IssueTracker for JiraClient {
    #[instrument(skip(self, description))]
    async fn create_epic(&self, title: &str, description: &str) -> Option<IssueKey> {
        let payload = self.issue_payload(title, description, "Epic", None);
        match self.create_issue("create_epic", payload).await {
            Ok(key) => {
                info!(%key, "epic created");
                Some(key)
            }
            Err(e) => {
                warn!(error = %e, "failed to create epic");
                None
            }
        }
    }

    #[instrument(skip(self, description))]
    async fn create_story(
        &self,
        title: &str,
        description: &str,
        parent: &IssueKey,
    ) -> Option<IssueKey> {
        let payload = self.issue_payload(title, description, "Story", Some(parent));
        match self.create_issue("create_story", payload).await {
            Ok(key) => {
                debug!(%key, "story created");
                Some(key)
            }
            Err(e) => {
                warn!(error = %e, "failed to create story");
                None
            }
        }
    }

    #[instrument(skip(self))]
    async fn assign_story(&self, key: &IssueKey, email: &str) -> bool {
        match self.assign(key, email).await {
            Ok(()) => {
                info!("story assigned");
                true
            }
            Err(e) => {
                warn!(error = %e, "failed to assign story");
                false
            }
        }
    }

    #[instrument(skip(self))]
    async fn create_sprint(
        &self,
        name: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<u64, Report<TrackerError>> {
        let request = self
            .client
            .post(self.url("/rest/agile/1.0/sprint"))
            .json(&self.sprint_payload(name, start, end));
        let response = self.send("create_sprint", request, StatusCode::CREATED).await?;
        let created: CreatedSprint =
            response
                .json()
                .await
                .map_err(|_| TrackerError::MissingField {
                    operation: "create_sprint",
                    field: "id",
                })?;
        info!(sprint_id = created.id, "sprint created");
        Ok(created.id)
    }

    #[instrument(skip(self, keys), fields(stories = keys.len()))]
    async fn assign_stories_to_sprint(&self, sprint_id: u64, keys: &[IssueKey]) -> usize {
        let mut moved = 0;
        for key in keys {
            match self.move_to_sprint(sprint_id, key).await {
                Ok(()) => {
                    debug!(%key, "story moved to sprint");
                    moved += 1;
                }
                Err(e) => error!(%key, error = %e, "failed to move story to sprint"),
            }
        }
        moved
    }
}
