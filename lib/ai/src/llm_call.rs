//! A single planner prompt, ready to send.
//!
//! Rendered [`PromptTemplate`](crate::PromptTemplate)s become an [`LlmCall`];
//! [`complete_as`](crate::complete_as) attaches the reply schema and turns it
//! into an [`LlmRequest`]. Sampling settings are left to the completer.

use crate::backend::{LlmRequest, LlmResponse, OutputFormat, TokenUsage};
use serde_json::Value as JsonValue;
use ulid::Ulid;

/// Identifies one completion in the logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LlmInvocationId(Ulid);

impl LlmInvocationId {
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for LlmInvocationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for LlmInvocationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "llm_{}", self.0)
    }
}

/// What came back from one completion, with timing.
#[derive(Debug, Clone)]
pub struct LlmCallResult {
    pub id: LlmInvocationId,
    pub content: String,
    pub usage: TokenUsage,
    pub model: String,
    pub latency_ms: u64,
}

impl LlmCallResult {
    #[must_use]
    pub fn from_response(response: LlmResponse, latency_ms: u64) -> Self {
        Self {
            id: LlmInvocationId::new(),
            content: response.content,
            usage: response.usage,
            model: response.model,
            latency_ms,
        }
    }
}

/// Prompt text plus the schema the reply must follow.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmCall {
    prompt: String,
    system_prompt: Option<String>,
    output: Option<OutputFormat>,
}

impl LlmCall {
    #[must_use]
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system_prompt: None,
            output: None,
        }
    }

    #[must_use]
    pub fn with_system_prompt(mut self, system: impl Into<String>) -> Self {
        self.system_prompt = Some(system.into());
        self
    }

    /// Replaces any schema set earlier.
    #[must_use]
    pub fn with_output_schema(mut self, name: impl Into<String>, schema: JsonValue) -> Self {
        self.output = Some(OutputFormat {
            name: name.into(),
            schema,
        });
        self
    }

    /// Converts into a request with no sampling overrides.
    #[must_use]
    pub fn into_request(self) -> LlmRequest {
        LlmRequest {
            prompt: self.prompt,
            system: self.system_prompt,
            output: self.output,
            temperature: None,
            max_tokens: None,
        }
    }
}
