//! Error types for the AI crate.
//!
//! `LlmError` covers the HTTP backend, `PromptError` template lookup and
//! rendering, `CompletionError` everything between a prompt and a typed
//! reply.

use std::fmt;

/// Errors from LLM backend operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LlmError {
    /// The endpoint could not be reached.
    ProviderUnavailable { provider: String, reason: String },
    /// The provider answered with an error status.
    RequestFailed { reason: String },
    /// The provider's envelope (not the model's reply) was malformed.
    ResponseParseFailed { reason: String },
    Timeout,
    /// HTTP 429, with the `Retry-After` value when sent.
    RateLimited { retry_after_secs: Option<u64> },
    InvalidConfig { reason: String },
}

impl fmt::Display for LlmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProviderUnavailable { provider, reason } => {
                write!(f, "LLM provider '{provider}' unavailable: {reason}")
            }
            Self::RequestFailed { reason } => {
                write!(f, "LLM request failed: {reason}")
            }
            Self::ResponseParseFailed { reason } => {
                write!(f, "failed to parse LLM response: {reason}")
            }
            Self::Timeout => write!(f, "LLM request timed out"),
            Self::RateLimited { retry_after_secs } => {
                if let Some(secs) = retry_after_secs {
                    write!(f, "rate limited, retry after {secs}s")
                } else {
                    write!(f, "rate limited")
                }
            }
            Self::InvalidConfig { reason } => {
                write!(f, "invalid LLM configuration: {reason}")
            }
        }
    }
}

impl std::error::Error for LlmError {}

/// Errors from prompt operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptError {
    TemplateNotFound { name: String },
    /// A required placeholder had no value and no default.
    MissingVariable { template: String, variable: String },
}

impl fmt::Display for PromptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TemplateNotFound { name } => {
                write!(f, "prompt template not found: {name}")
            }
            Self::MissingVariable { template, variable } => {
                write!(
                    f,
                    "missing required variable '{variable}' in template '{template}'"
                )
            }
        }
    }
}

impl std::error::Error for PromptError {}

/// Errors from structured completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionError {
    /// The backend call failed.
    Provider { source: LlmError },
    /// The reply was not JSON.
    Parse { reason: String },
    /// The reply was JSON but did not match the requested schema.
    SchemaMismatch { schema: String, reason: String },
}

impl fmt::Display for CompletionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Provider { source } => write!(f, "completion failed: {source}"),
            Self::Parse { reason } => write!(f, "completion is not valid JSON: {reason}"),
            Self::SchemaMismatch { schema, reason } => {
                write!(f, "completion does not match schema '{schema}': {reason}")
            }
        }
    }
}

impl std::error::Error for CompletionError {}

impl From<LlmError> for CompletionError {
    fn from(source: LlmError) -> Self {
        Self::Provider { source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn llm_error_display() {
        let err = LlmError::ProviderUnavailable {
            provider: "watsonx".to_string(),
            reason: "connection refused".to_string(),
        };
        assert!(err.to_string().contains("watsonx"));
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn prompt_error_display() {
        let err = PromptError::MissingVariable {
            template: "stories".to_string(),
            variable: "epic".to_string(),
        };
        assert!(err.to_string().contains("epic"));
        assert!(err.to_string().contains("stories"));
    }

    #[test]
    fn completion_error_wraps_backend_error() {
        let err = CompletionError::from(LlmError::Timeout);
        assert_eq!(
            err,
            CompletionError::Provider {
                source: LlmError::Timeout
            }
        );
        assert!(err.to_string().contains("timed out"));
    }
}
