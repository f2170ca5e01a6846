//! Error types for the planning crate.

use std::fmt;

/// Errors from capacity estimation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapacityError {
    /// The roster is empty, so no duration can be derived.
    NoEmployees,
}

impl fmt::Display for CapacityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoEmployees => write!(f, "no employees found for the project"),
        }
    }
}

impl std::error::Error for CapacityError {}
