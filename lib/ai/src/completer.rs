//! Structured completion.
//!
//! A [`StructuredCompleter`] turns a request carrying an output schema into
//! a JSON value that follows it. Callers that want a Rust type use
//! [`complete_as`], which attaches the type's schema and deserializes the
//! reply. Nothing here retries; callers decide.

use crate::backend::{LlmBackend, LlmConfig, LlmRequest};
use crate::error::CompletionError;
use crate::llm_call::{LlmCall, LlmCallResult};
use async_trait::async_trait;
use rootcause::prelude::Report;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::time::Instant;
use tracing::{debug, instrument};

/// A type an LLM can be asked to produce.
pub trait OutputSchema: DeserializeOwned {
    /// Schema name sent to the provider.
    const NAME: &'static str;

    /// JSON schema describing the serialized form.
    fn schema() -> JsonValue;
}

/// Produces JSON replies that follow a requested schema.
#[async_trait]
pub trait StructuredCompleter: Send + Sync {
    /// Runs one completion.
    ///
    /// # Errors
    ///
    /// Returns `Provider` when the backend fails, `Parse` when the reply is
    /// not JSON, and `SchemaMismatch` when it lacks a required field.
    async fn complete(&self, request: LlmRequest) -> Result<JsonValue, Report<CompletionError>>;
}

/// Requests a `T` and deserializes the reply.
///
/// # Errors
///
/// Propagates completion errors; a reply that does not deserialize into `T`
/// is a `SchemaMismatch`.
pub async fn complete_as<T: OutputSchema>(
    completer: &dyn StructuredCompleter,
    call: LlmCall,
) -> Result<T, Report<CompletionError>> {
    let request = call.with_output_schema(T::NAME, T::schema()).into_request();
    let value = completer.complete(request).await?;
    let parsed = serde_json::from_value(value).map_err(|e| CompletionError::SchemaMismatch {
        schema: T::NAME.to_string(),
        reason: e.to_string(),
    })?;
    Ok(parsed)
}

/// Strips a Markdown code fence some models wrap JSON replies in.
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(body) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = body.strip_prefix("json").unwrap_or(body);
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// Checks the fields the schema marks as required at the top level.
fn check_required(
    name: &str,
    schema: &JsonValue,
    value: &JsonValue,
) -> Result<(), CompletionError> {
    let Some(required) = schema.get("required").and_then(JsonValue::as_array) else {
        return Ok(());
    };
    let Some(object) = value.as_object() else {
        return Err(CompletionError::SchemaMismatch {
            schema: name.to_string(),
            reason: "expected a JSON object".to_string(),
        });
    };

    match required
        .iter()
        .filter_map(JsonValue::as_str)
        .find(|field| !object.contains_key(*field))
    {
        Some(field) => Err(CompletionError::SchemaMismatch {
            schema: name.to_string(),
            reason: format!("missing field '{field}'"),
        }),
        None => Ok(()),
    }
}

/// A [`StructuredCompleter`] over any [`LlmBackend`].
///
/// Requests without a temperature or token cap get the configured ones.
pub struct BackendCompleter<B> {
    backend: B,
    temperature: f32,
    max_tokens: u32,
}

impl<B: LlmBackend> BackendCompleter<B> {
    /// Wraps a backend, taking sampling defaults from `config`.
    #[must_use]
    pub fn new(backend: B, config: &LlmConfig) -> Self {
        Self {
            backend,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    /// Returns the wrapped backend.
    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }
}

#[async_trait]
impl<B: LlmBackend> StructuredCompleter for BackendCompleter<B> {
    #[instrument(
        skip(self, request),
        fields(model = self.backend.model(), schema = tracing::field::Empty)
    )]
    async fn complete(
        &self,
        mut request: LlmRequest,
    ) -> Result<JsonValue, Report<CompletionError>> {
        request.temperature.get_or_insert(self.temperature);
        request.max_tokens.get_or_insert(self.max_tokens);
        if let Some(output) = &request.output {
            tracing::Span::current().record("schema", output.name.as_str());
        }

        let started = Instant::now();
        let response = self
            .backend
            .generate(&request)
            .await
            .map_err(CompletionError::from)?;
        let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let result = LlmCallResult::from_response(response, latency_ms);
        debug!(
            invocation = %result.id,
            latency_ms,
            tokens = result.usage.total(),
            "completion received"
        );

        let value: JsonValue = serde_json::from_str(strip_code_fence(&result.content))
            .map_err(|e| CompletionError::Parse {
                reason: e.to_string(),
            })?;

        if let Some(output) = &request.output {
            check_required(&output.name, &output.schema, &value)?;
        }
        Ok(value)
    }
}
