//! Error types for the planning pipeline.
//!
//! Step bodies convert everything they hit into a
//! [`StepError`](sprintcraft_workflow::StepError); the helpers at the bottom
//! keep those conversions uniform across steps.

use sprintcraft_ai::PromptError;
use sprintcraft_planning::CapacityError;
use rootcause::prelude::Report;
use sprintcraft_workflow::StepError;
use std::fmt;
use tracing::warn;

/// Errors from reading the task and employee files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestError {
    /// The file could not be opened.
    Io { path: String, reason: String },
    /// The file has no row at the configured header position.
    MissingHeader { path: String, header_row: usize },
    /// A required column is absent from the header row.
    MissingColumn { path: String, column: String },
    /// A row could not be decoded.
    Csv { path: String, reason: String },
}

impl fmt::Display for IngestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, reason } => write!(f, "cannot read {path}: {reason}"),
            Self::MissingHeader { path, header_row } => {
                write!(f, "{path} has no header at row {header_row}")
            }
            Self::MissingColumn { path, column } => {
                write!(f, "{path} is missing required column '{column}'")
            }
            Self::Csv { path, reason } => write!(f, "malformed CSV in {path}: {reason}"),
        }
    }
}

impl std::error::Error for IngestError {}

/// Errors from the LLM-backed assignment advisor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdvisorError {
    Prompt { reason: String },
    Completion { reason: String },
}

impl fmt::Display for AdvisorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Prompt { reason } => write!(f, "assignment prompt failed: {reason}"),
            Self::Completion { reason } => write!(f, "assignment completion failed: {reason}"),
        }
    }
}

impl std::error::Error for AdvisorError {}

pub(crate) fn ingest_failed(report: Report<IngestError>) -> StepError {
    warn!(error = %report, "input data rejected");
    StepError::invalid_input(report.current_context())
}

pub(crate) fn capacity_failed(e: &CapacityError) -> StepError {
    StepError::invalid_input(e)
}

pub(crate) fn prompt_failed(e: &PromptError) -> StepError {
    StepError::ExecutionFailed {
        message: e.to_string(),
    }
}

pub(crate) fn llm_failed<C: fmt::Display>(report: Report<C>) -> StepError {
    collaborator_failed("llm", &report)
}

pub(crate) fn tracker_failed<C: fmt::Display>(report: Report<C>) -> StepError {
    collaborator_failed("tracker", &report)
}

pub(crate) fn holidays_failed<C: fmt::Display>(report: Report<C>) -> StepError {
    collaborator_failed("holidays", &report)
}

/// Logs the whole report and keeps only its top context in the step error.
fn collaborator_failed<C: fmt::Display>(service: &'static str, report: &Report<C>) -> StepError {
    warn!(service, error = %report, "collaborator call failed");
    StepError::external(service, report.current_context())
}
