use crate::id::EmployeeId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// How well an employee knows a skill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Proficiency {
    Beginner,
    Intermediate,
    Expert,
}

impl Proficiency {
    /// Returns the roster spelling of the level.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Beginner => "Beginner",
            Self::Intermediate => "Intermediate",
            Self::Expert => "Expert",
        }
    }
}

impl fmt::Display for Proficiency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Proficiency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "beginner" => Ok(Self::Beginner),
            "intermediate" => Ok(Self::Intermediate),
            "expert" => Ok(Self::Expert),
            other => Err(format!("unknown proficiency level '{other}'")),
        }
    }
}

/// A named skill with a proficiency level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    pub name: String,
    pub proficiency: Proficiency,
}

/// A single planned day of leave.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leave {
    /// What the leave is for (holiday, wedding, ...).
    pub occasion: String,
    pub date: NaiveDate,
}

/// A roster entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub emp_id: EmployeeId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub skills: Vec<Skill>,
    #[serde(default)]
    pub leave_plans: Vec<Leave>,
}

impl Employee {
    /// Creates an employee without skills or leave.
    #[must_use]
    pub fn new(
        emp_id: impl Into<EmployeeId>,
        name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            emp_id: emp_id.into(),
            name: name.into(),
            email: email.into(),
            skills: Vec::new(),
            leave_plans: Vec::new(),
        }
    }

    /// Adds a skill.
    #[must_use]
    pub fn with_skill(mut self, name: impl Into<String>, proficiency: Proficiency) -> Self {
        self.skills.push(Skill {
            name: name.into(),
            proficiency,
        });
        self
    }

    /// Adds a day of leave.
    #[must_use]
    pub fn with_leave(mut self, occasion: impl Into<String>, date: NaiveDate) -> Self {
        self.leave_plans.push(Leave {
            occasion: occasion.into(),
            date,
        });
        self
    }

    /// Counts leave days falling inside `[start, end]`, both ends inclusive.
    #[must_use]
    pub fn leave_days_between(&self, start: NaiveDate, end: NaiveDate) -> usize {
        self.leave_plans
            .iter()
            .filter(|leave| start <= leave.date && leave.date <= end)
            .count()
    }
}

/// Remaining story-point capacity of one employee for a date window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeCapacity {
    /// Employee display name.
    pub name: String,
    /// Remaining points. Planning estimates may leave this negative.
    pub remaining_points: i64,
    /// Skills, carried along so the assignment prompt can see them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skills: Option<Vec<Skill>>,
    /// Title of the story most recently assigned to this employee.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_story: Option<String>,
}

impl EmployeeCapacity {
    /// Creates a capacity record.
    #[must_use]
    pub fn new(name: impl Into<String>, remaining_points: i64) -> Self {
        Self {
            name: name.into(),
            remaining_points,
            skills: None,
            last_story: None,
        }
    }

    /// Attaches the employee's skills.
    #[must_use]
    pub fn with_skills(mut self, skills: Vec<Skill>) -> Self {
        self.skills = Some(skills);
        self
    }
}

/// Per-employee bandwidth, ordered by employee id.
pub type BandwidthMap = BTreeMap<EmployeeId, EmployeeCapacity>;

/// The employee roster, ordered by employee id.
pub type Roster = BTreeMap<EmployeeId, Employee>;
