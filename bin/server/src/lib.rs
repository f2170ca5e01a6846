//! sprintcraft HTTP server.
//!
//! Exposes the planning graph over HTTP: `POST /invoke` runs a plan,
//! `GET /graph` and `GET /graph.dot` render the graph, `GET /health`
//! answers liveness probes.

pub mod config;
pub mod error;
pub mod routes;

pub use config::ServerConfig;
pub use error::{ApiError, StartupError};
pub use routes::{AppState, PlanSummary, router};
