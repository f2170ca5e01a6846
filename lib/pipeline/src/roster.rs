//! Task and employee file ingestion.
//!
//! Both files are spreadsheet exports with a title row above the column
//! names, so the header sits at a configurable row and everything above it
//! is ignored.
//!
//! Cell formats:
//! - `Skills`: `[Rust, Expert], [Go, Beginner]`
//! - `Leave plan`: `[Holiday, 2024-01-15],[Trip, 2024-02-01]`

use crate::error::IngestError;
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim};
use rootcause::prelude::Report;
use sprintcraft_core::{Employee, Leave, Roster, Skill, TaskArea};
use std::path::Path;
use tracing::{debug, info, warn};

const TASK: &str = "Task";
const SUB_TASK: &str = "Sub-task";
const EMPLOYEE_ID: &str = "Employee id";
const NAME: &str = "name";
const EMAIL: &str = "Email id";
const SKILLS: &str = "Skills";
const LEAVE_PLAN: &str = "Leave plan";

const LEAVE_DATE_FORMAT: &str = "%Y-%m-%d";

/// A CSV file split into its header and the data rows below it.
struct Table {
    path: String,
    header: StringRecord,
    rows: Vec<StringRecord>,
}

impl Table {
    fn open(path: &Path, header_row: usize) -> Result<Self, Report<IngestError>> {
        let display = path.display().to_string();
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(Trim::All)
            .from_path(path)
            .map_err(|e| IngestError::Io {
                path: display.clone(),
                reason: e.to_string(),
            })?;

        let mut records = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| IngestError::Csv {
                path: display.clone(),
                reason: e.to_string(),
            })?;
            records.push(record);
        }

        let mut records = records.into_iter().skip(header_row);
        let Some(header) = records.next() else {
            return Err(IngestError::MissingHeader {
                path: display,
                header_row,
            }
            .into());
        };
        let rows = records
            .filter(|row| row.iter().any(|cell| !cell.is_empty()))
            .collect();

        Ok(Self {
            path: display,
            header,
            rows,
        })
    }

    fn column(&self, name: &str) -> Result<usize, Report<IngestError>> {
        self.header
            .iter()
            .position(|cell| cell == name)
            .ok_or_else(|| {
                IngestError::MissingColumn {
                    path: self.path.clone(),
                    column: name.to_string(),
                }
                .into()
            })
    }
}

fn cell(row: &StringRecord, column: usize) -> &str {
    row.get(column).unwrap_or_default()
}

/// Reads the task file, grouping subtasks under their area.
///
/// Areas keep the order they first appear in; empty subtasks are dropped.
///
/// # Errors
///
/// Fails if the file cannot be read, has no header row, or lacks the `Task`
/// or `Sub-task` column.
pub fn read_tasks(path: &Path, header_row: usize) -> Result<Vec<TaskArea>, Report<IngestError>> {
    let table = Table::open(path, header_row)?;
    let task = table.column(TASK)?;
    let sub_task = table.column(SUB_TASK)?;

    let mut areas: Vec<TaskArea> = Vec::new();
    for row in &table.rows {
        let area = cell(row, task);
        if area.is_empty() {
            debug!(path = %table.path, "skipping row without a task area");
            continue;
        }

        let position = match areas.iter().position(|existing| existing.area == area) {
            Some(position) => position,
            None => {
                areas.push(TaskArea {
                    area: area.to_string(),
                    subtasks: Vec::new(),
                });
                areas.len() - 1
            }
        };

        let subtask = cell(row, sub_task);
        if !subtask.is_empty() {
            areas[position].subtasks.push(subtask.to_string());
        }
    }

    info!(path = %table.path, areas = areas.len(), "task file loaded");
    Ok(areas)
}

/// Reads the employee roster.
///
/// A later row with an already seen id replaces the earlier one.
///
/// # Errors
///
/// Fails if the file cannot be read, has no header row, or lacks any of the
/// roster columns.
pub fn read_employees(path: &Path, header_row: usize) -> Result<Roster, Report<IngestError>> {
    let table = Table::open(path, header_row)?;
    let id = table.column(EMPLOYEE_ID)?;
    let name = table.column(NAME)?;
    let email = table.column(EMAIL)?;
    let skills = table.column(SKILLS)?;
    let leave_plan = table.column(LEAVE_PLAN)?;

    let mut roster = Roster::new();
    for row in &table.rows {
        let emp_id = cell(row, id);
        if emp_id.is_empty() {
            warn!(path = %table.path, "skipping roster row without an employee id");
            continue;
        }

        let mut employee = Employee::new(emp_id, cell(row, name), cell(row, email));
        employee.skills = parse_skills(cell(row, skills));
        employee.leave_plans = parse_leaves(cell(row, leave_plan));
        roster.insert(employee.emp_id.clone(), employee);
    }

    info!(path = %table.path, employees = roster.len(), "employee file loaded");
    Ok(roster)
}

/// Splits a bracketed list cell into `(label, value)` pairs, splitting each
/// entry on its last comma. Entries without a comma are ignored.
fn bracketed_pairs(raw: &str) -> impl Iterator<Item = (&str, &str)> {
    raw.trim_matches('"')
        .split("], ")
        .map(|entry| entry.trim_matches(|c| c == '[' || c == ']' || c == ' '))
        .filter_map(|entry| entry.rsplit_once(','))
        .map(|(label, value)| (label.trim(), value.trim()))
}

/// Parses a `Skills` cell. Entries with an unknown proficiency are skipped.
#[must_use]
pub fn parse_skills(raw: &str) -> Vec<Skill> {
    bracketed_pairs(raw)
        .filter_map(|(name, level)| match level.parse() {
            Ok(proficiency) => Some(Skill {
                name: name.to_string(),
                proficiency,
            }),
            Err(reason) => {
                warn!(skill = name, %reason, "skipping skill");
                None
            }
        })
        .collect()
}

/// Parses a `Leave plan` cell. Entries with an unreadable date are skipped.
#[must_use]
pub fn parse_leaves(raw: &str) -> Vec<Leave> {
    let normalized = raw.replace("],[", "], [");
    bracketed_pairs(&normalized)
        .filter_map(
            |(occasion, date)| match NaiveDate::parse_from_str(date, LEAVE_DATE_FORMAT) {
                Ok(date) => Some(Leave {
                    occasion: occasion.to_string(),
                    date,
                }),
                Err(e) => {
                    warn!(occasion, date, error = %e, "skipping leave entry");
                    None
                }
            },
        )
        .collect()
}
