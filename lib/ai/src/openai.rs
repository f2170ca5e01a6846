//! OpenAI-compatible chat-completions backend.
//!
//! Works against OpenAI itself and any gateway that speaks the same
//! protocol (watsonx, vLLM, LiteLLM). Structured output is requested with
//! `response_format: {type: "json_schema"}`.

use crate::backend::{LlmBackend, LlmConfig, LlmProvider, LlmRequest, LlmResponse, TokenUsage};
use crate::error::LlmError;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Backend speaking the OpenAI chat-completions protocol.
pub struct OpenAiCompatibleBackend {
    client: Client,
    config: LlmConfig,
}

impl OpenAiCompatibleBackend {
    /// Creates a backend from configuration.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the base URL is empty or the HTTP client
    /// cannot be built.
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        if config.base_url.trim().is_empty() {
            return Err(LlmError::InvalidConfig {
                reason: "base_url is empty".to_string(),
            });
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LlmError::InvalidConfig {
                reason: e.to_string(),
            })?;
        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    fn chat_request(&self, request: &LlmRequest) -> ChatRequest {
        ChatRequest {
            model: self.config.model.clone(),
            messages: request
                .messages()
                .into_iter()
                .map(|message| ChatMessage {
                    role: message.role.as_str().to_string(),
                    content: message.content,
                })
                .collect(),
            max_tokens: Some(request.max_tokens.unwrap_or(self.config.max_tokens)),
            temperature: Some(request.temperature.unwrap_or(self.config.temperature)),
            response_format: request.output.as_ref().map(|output| ResponseFormat {
                kind: "json_schema",
                json_schema: JsonSchemaFormat {
                    name: output.name.clone(),
                    schema: output.schema.clone(),
                    strict: false,
                },
            }),
        }
    }
}

fn parse_response(body: ChatResponse) -> Result<LlmResponse, LlmError> {
    let content = body
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| LlmError::ResponseParseFailed {
            reason: "response contained no choices".to_string(),
        })?;
    let usage = body.usage.map_or_else(TokenUsage::default, |usage| TokenUsage {
        input_tokens: usage.prompt_tokens,
        output_tokens: usage.completion_tokens,
    });
    Ok(LlmResponse {
        content,
        usage,
        model: body.model,
    })
}

#[async_trait]
impl LlmBackend for OpenAiCompatibleBackend {
    #[instrument(skip(self, request), fields(model = %self.config.model))]
    async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        let mut builder = self.client.post(self.endpoint()).json(&self.chat_request(request));
        if let Some(api_key) = &self.config.api_key {
            builder = builder.bearer_auth(api_key);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                LlmError::Timeout
            } else if e.is_connect() {
                LlmError::ProviderUnavailable {
                    provider: self.config.base_url.clone(),
                    reason: e.to_string(),
                }
            } else {
                LlmError::RequestFailed {
                    reason: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.parse().ok());
            warn!(?retry_after_secs, "LLM provider rate limited the request");
            return Err(LlmError::RateLimited { retry_after_secs });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::RequestFailed {
                reason: format!("HTTP {status}: {body}"),
            });
        }

        let body: ChatResponse =
            response
                .json()
                .await
                .map_err(|e| LlmError::ResponseParseFailed {
                    reason: e.to_string(),
                })?;
        let parsed = parse_response(body)?;
        debug!(tokens = parsed.usage.total(), "chat completion finished");
        Ok(parsed)
    }

    fn provider(&self) -> LlmProvider {
        self.config.provider()
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

// Request/Response types

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
    json_schema: JsonSchemaFormat,
}

#[derive(Debug, Serialize)]
struct JsonSchemaFormat {
    name: String,
    schema: JsonValue,
    strict: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: String,
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn backend() -> OpenAiCompatibleBackend {
        OpenAiCompatibleBackend::new(LlmConfig {
            base_url: "http://localhost:8080/v1/".to_string(),
            model: "granite".to_string(),
            ..LlmConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn endpoint_ignores_trailing_slash() {
        assert_eq!(backend().endpoint(), "http://localhost:8080/v1/chat/completions");
    }

    #[test]
    fn request_body_carries_schema_and_defaults() {
        let request = LlmRequest::new("List epics")
            .with_system("You are a planner.")
            .with_output("epics", json!({"type": "object"}));
        let body = serde_json::to_value(backend().chat_request(&request)).unwrap();

        assert_eq!(body["model"], "granite");
        assert_eq!(body["max_tokens"], 250);
        assert_eq!(body["temperature"], 0.0);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "List epics");
        assert_eq!(body["response_format"]["type"], "json_schema");
        assert_eq!(body["response_format"]["json_schema"]["name"], "epics");
    }

    #[test]
    fn request_without_schema_omits_response_format() {
        let body = serde_json::to_value(backend().chat_request(&LlmRequest::new("hi"))).unwrap();
        assert!(body.get("response_format").is_none());
    }

    #[test]
    fn response_parsing() {
        let body: ChatResponse = serde_json::from_value(json!({
            "model": "granite",
            "choices": [{"message": {"role": "assistant", "content": "{\"epics\": []}"}}],
            "usage": {"prompt_tokens": 12, "completion_tokens": 5, "total_tokens": 17}
        }))
        .unwrap();

        let response = parse_response(body).unwrap();
        assert_eq!(response.content, "{\"epics\": []}");
        assert_eq!(response.usage.total(), 17);
    }

    #[test]
    fn empty_choices_is_a_parse_failure() {
        let body: ChatResponse = serde_json::from_value(json!({"choices": []})).unwrap();
        assert!(matches!(
            parse_response(body),
            Err(LlmError::ResponseParseFailed { .. })
        ));
    }

    #[test]
    fn empty_base_url_is_rejected() {
        let result = OpenAiCompatibleBackend::new(LlmConfig {
            base_url: " ".to_string(),
            ..LlmConfig::default()
        });
        assert!(matches!(result, Err(LlmError::InvalidConfig { .. })));
    }
}
