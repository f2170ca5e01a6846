//! LLM primitives for sprintcraft.
//!
//! - **Backend**: provider abstraction ([`LlmBackend`]) and the
//!   OpenAI-compatible HTTP implementation
//! - **LLM Call**: single-shot inference with optional structured output
//! - **Prompts**: `{{var}}` templates and a registry
//! - **Completer**: schema-checked JSON completion ([`StructuredCompleter`])
//!   and the typed [`complete_as`] helper

pub mod backend;
pub mod completer;
pub mod error;
pub mod llm_call;
pub mod openai;
pub mod prompt;

pub use backend::{
    LlmBackend, LlmConfig, LlmMessage, LlmProvider, LlmRequest, LlmResponse, MessageRole,
    OutputFormat, TokenUsage,
};
pub use completer::{BackendCompleter, OutputSchema, StructuredCompleter, complete_as};
pub use error::{CompletionError, LlmError, PromptError};
pub use llm_call::{LlmCall, LlmCallResult, LlmInvocationId};
pub use openai::OpenAiCompatibleBackend;
pub use prompt::{PromptRegistry, PromptTemplate, VariableDefinition};
