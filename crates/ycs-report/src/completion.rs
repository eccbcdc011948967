//! Chat-completion seam and the Mistral client behind it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::{debug, warn};
use ycs_storage::HttpClient;

use crate::ReportError;

pub const DEFAULT_MISTRAL_URL: &str = "https://api.mistral.ai/v1";

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub prompt: String,
    pub temperature: f32,
    /// Ask the endpoint for a JSON object response when it supports that.
    pub json_mode: bool,
}

#[async_trait]
pub trait CompletionApi: Send + Sync {
    /// Free-form message content of the first choice.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ReportError>;
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: JsonValue,
}

/// Message content is usually a string; some models return a list of typed chunks.
fn content_text(content: &JsonValue) -> Option<String> {
    let text = match content {
        JsonValue::String(text) => Some(text.clone()),
        JsonValue::Array(chunks) => {
            let text = chunks
                .iter()
                .filter_map(|chunk| chunk.get("text").and_then(JsonValue::as_str))
                .collect::<String>();
            Some(text)
        }
        _ => None,
    };
    text.filter(|text| !text.trim().is_empty())
}

/// Status codes meaning "this endpoint does not accept `response_format`".
fn rejects_structured_output(err: &ReportError) -> bool {
    matches!(err, ReportError::Completion(fetch) if matches!(fetch.status(), Some(400 | 422)))
}

#[derive(Debug, Clone)]
pub struct MistralChat {
    http: HttpClient,
    base_url: String,
    model: String,
    api_key: String,
}

impl MistralChat {
    pub fn new(
        http: HttpClient,
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: api_key.into(),
        }
    }

    async fn send(&self, request: &CompletionRequest, json_mode: bool) -> Result<String, ReportError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: &request.prompt,
            }],
            temperature: request.temperature,
            response_format: json_mode.then_some(ResponseFormat {
                kind: "json_object",
            }),
        };
        let response: ChatResponse = self
            .http
            .execute_json("mistral-chat", |client| {
                client.post(&url).bearer_auth(&self.api_key).json(&body)
            })
            .await?;

        let content = response
            .choices
            .first()
            .and_then(|choice| content_text(&choice.message.content))
            .ok_or(ReportError::EmptyCompletion)?;
        debug!(chars = content.len(), json_mode, "completion received");
        Ok(content)
    }
}

#[async_trait]
impl CompletionApi for MistralChat {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ReportError> {
        if !request.json_mode {
            return self.send(request, false).await;
        }
        match self.send(request, true).await {
            Err(err) if rejects_structured_output(&err) => {
                warn!(error = %err, "structured output rejected; retrying as free text");
                self.send(request, false).await
            }
            other => other,
        }
    }
}
