//! Error types for the HTTP surface.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use sprintcraft_workflow::{EngineError, StepError};
use std::fmt;

/// A planning run that could not be served.
#[derive(Debug)]
pub enum ApiError {
    /// The run failed inside the engine.
    Planning(EngineError),
    /// The server began shutting down while the run was in flight.
    ShuttingDown,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Planning(e) => write!(f, "planning failed: {e}"),
            Self::ShuttingDown => write!(f, "server is shutting down"),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<EngineError> for ApiError {
    fn from(e: EngineError) -> Self {
        Self::Planning(e)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Planning(EngineError::StepFailed { source, .. }) => match source {
                StepError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
                StepError::ExternalService { .. } => StatusCode::BAD_GATEWAY,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Planning(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ShuttingDown => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let node = match &self {
            Self::Planning(EngineError::StepFailed { node, .. }) => Some(*node),
            _ => None,
        };
        if status.is_server_error() {
            tracing::error!(%status, error = %self, "planning request failed");
        } else {
            tracing::warn!(%status, error = %self, "planning request rejected");
        }

        let body = json!({
            "error": self.to_string(),
            "node": node,
        });
        (status, Json(body)).into_response()
    }
}

/// Failures while bringing the server up.
#[derive(Debug)]
pub enum StartupError {
    /// Configuration could not be loaded.
    Config { reason: String },
    /// A collaborator client could not be built.
    Client { service: &'static str, reason: String },
    /// The planning graph failed validation.
    Graph(EngineError),
    /// Binding or serving failed.
    Io { reason: String },
}

impl fmt::Display for StartupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config { reason } => write!(f, "failed to load configuration: {reason}"),
            Self::Client { service, reason } => {
                write!(f, "failed to build {service} client: {reason}")
            }
            Self::Graph(e) => write!(f, "invalid planner graph: {e}"),
            Self::Io { reason } => write!(f, "server i/o error: {reason}"),
        }
    }
}

impl std::error::Error for StartupError {}
