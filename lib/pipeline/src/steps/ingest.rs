use crate::config::PlannerConfig;
use crate::error::ingest_failed;
use crate::node::PlannerNode;
use crate::roster::{read_employees, read_tasks};
use crate::state::{PlannerState, PlannerUpdate};
use async_trait::async_trait;
use sprintcraft_core::Epic;
use sprintcraft_workflow::{GraphState, Step, StepError, StateUpdate};
use std::path::PathBuf;
use tokio::task::JoinError;
use tracing::info;

/// Entry router. Sends a run without task data to the loader and otherwise
/// follows the decision already in the state, so re-entering is harmless.
///
/// # Errors
///
/// Never fails; a missing decision surfaces as an engine routing error.
pub fn data_manager(state: &PlannerState) -> Result<PlannerUpdate, StepError> {
    if state.tasks_by_area.is_none() {
        return Ok(PlannerUpdate::goto(PlannerNode::LoadInputData));
    }
    Ok(state
        .routing()
        .map(PlannerUpdate::routed)
        .unwrap_or_default())
}

fn reader_panicked(e: JoinError) -> StepError {
    StepError::ExecutionFailed {
        message: format!("file reader task failed: {e}"),
    }
}

/// Reads the task file and seeds one placeholder epic per area.
pub struct LoadInputData {
    default_path: PathBuf,
    header_row: usize,
}

impl LoadInputData {
    #[must_use]
    pub fn new(config: &PlannerConfig) -> Self {
        Self {
            default_path: PathBuf::from(&config.tasks_csv),
            header_row: config.header_row,
        }
    }
}

#[async_trait]
impl Step<PlannerState> for LoadInputData {
    async fn run(&self, state: &PlannerState) -> Result<PlannerUpdate, StepError> {
        let path = match state.input.csv_path.as_deref() {
            Some(path) if !path.trim().is_empty() => PathBuf::from(path),
            _ => self.default_path.clone(),
        };
        info!(path = %path.display(), "loading input data");

        let header_row = self.header_row;
        let tasks = tokio::task::spawn_blocking(move || read_tasks(&path, header_row))
            .await
            .map_err(reader_panicked)?
            .map_err(ingest_failed)?;
        let epics = tasks
            .iter()
            .map(|task| Epic::new(task.area.clone(), ""))
            .collect();

        Ok(PlannerUpdate {
            tasks_by_area: Some(tasks),
            epics: Some(epics),
            ..PlannerUpdate::goto(PlannerNode::LoadEmployeeData)
        })
    }
}

/// Reads the employee roster.
pub struct LoadEmployeeData {
    path: PathBuf,
    header_row: usize,
}

impl LoadEmployeeData {
    #[must_use]
    pub fn new(config: &PlannerConfig) -> Self {
        Self {
            path: PathBuf::from(&config.employees_csv),
            header_row: config.header_row,
        }
    }
}

#[async_trait]
impl Step<PlannerState> for LoadEmployeeData {
    async fn run(&self, _state: &PlannerState) -> Result<PlannerUpdate, StepError> {
        info!(path = %self.path.display(), "loading employee data");
        let (path, header_row) = (self.path.clone(), self.header_row);
        let employees = tokio::task::spawn_blocking(move || read_employees(&path, header_row))
            .await
            .map_err(reader_panicked)?
            .map_err(ingest_failed)?;

        Ok(PlannerUpdate {
            employees_by_id: Some(employees),
            ..PlannerUpdate::goto(PlannerNode::EpicAndStories)
        })
    }
}
