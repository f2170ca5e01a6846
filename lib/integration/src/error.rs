//! Error types for the integration crate.
//!
//! Errors are designed for layered context using rootcause:
//! - `TrackerError`: Issue tracker calls and retry exhaustion
//! - `HolidayError`: Public holiday lookups

use std::fmt;

/// Errors from issue tracker operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerError {
    /// The request never produced a response.
    Http { operation: &'static str, reason: String },
    /// The tracker answered with an unexpected status.
    UnexpectedStatus {
        operation: &'static str,
        status: u16,
        body: String,
    },
    /// The response lacked a field the operation needs.
    MissingField {
        operation: &'static str,
        field: &'static str,
    },
    /// Story creation kept failing.
    RetriesExhausted { title: String, attempts: u32 },
    /// Invalid configuration.
    InvalidConfig { reason: String },
}

impl fmt::Display for TrackerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http { operation, reason } => {
                write!(f, "tracker request '{operation}' failed: {reason}")
            }
            Self::UnexpectedStatus {
                operation,
                status,
                body,
            } => write!(f, "tracker '{operation}' returned HTTP {status}: {body}"),
            Self::MissingField { operation, field } => {
                write!(f, "tracker '{operation}' response has no '{field}'")
            }
            Self::RetriesExhausted { title, attempts } => {
                write!(f, "failed to create story '{title}' after {attempts} attempts")
            }
            Self::InvalidConfig { reason } => {
                write!(f, "invalid tracker configuration: {reason}")
            }
        }
    }
}

impl std::error::Error for TrackerError {}

/// Errors from holiday lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HolidayError {
    /// The request never produced a response.
    Http { reason: String },
    /// The calendar service answered with a non-200 status.
    UnexpectedStatus { status: u16, body: String },
    /// The response body could not be decoded.
    InvalidResponse { reason: String },
}

impl fmt::Display for HolidayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http { reason } => write!(f, "holiday request failed: {reason}"),
            Self::UnexpectedStatus { status, body } => {
                write!(f, "failed to fetch holidays (HTTP {status}): {body}")
            }
            Self::InvalidResponse { reason } => {
                write!(f, "invalid holiday response: {reason}")
            }
        }
    }
}

impl std::error::Error for HolidayError {}
