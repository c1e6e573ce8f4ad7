//! VLM interaction: build the chat-completions request and read the reply.
//!
//! One POST per file, no retry. The request carries a single user turn with
//! two content parts: the prompt text and the image as a data URI.
//!
//! ```text
//! {model, messages: [{role: "user", content: [
//!     {type: "text", text},
//!     {type: "image_url", image_url: {url: "data:<mime>;base64,<data>"}}
//! ]}]}
//! ```
//!
//! The reply must carry `choices[0].message.content` as a string; that string
//! is fence-stripped and parsed by [`crate::pipeline::parse`].

use crate::config::ProcessorConfig;
use crate::error::{DocprocError, FileError};
use crate::pipeline::encode::to_data_uri;
use crate::pipeline::normalize::NormalizedImage;
use crate::pipeline::parse::parse_model_output;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const NO_VALID_RESPONSE: &str = "No valid response from VLM";

// ── Request body ─────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
pub struct ChatMessage<'a> {
    pub role: &'static str,
    pub content: Vec<ContentPart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
pub struct ImageUrl {
    pub url: String,
}

impl<'a> ChatRequest<'a> {
    /// One user turn holding `prompt` and `data_uri`.
    pub fn new(model: &'a str, prompt: &'a str, data_uri: String) -> Self {
        Self {
            model,
            messages: vec![ChatMessage {
                role: "user",
                content: vec![
                    ContentPart::Text { text: prompt },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl { url: data_uri },
                    },
                ],
            }],
        }
    }
}

// ── Response envelope ────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<Value>,
}

/// Pull `choices[0].message.content` out of a 2xx body, if it is a string.
fn first_message_content(body: &str) -> Option<String> {
    let response: ChatResponse = serde_json::from_str(body).ok()?;
    match response.choices.into_iter().next()?.message?.content? {
        Value::String(s) => Some(s),
        _ => None,
    }
}

/// Best-effort detail for a non-2xx body: pretty JSON, else the raw text.
fn error_detail(body: &str) -> String {
    if body.trim().is_empty() {
        return "No additional error detail.".to_string();
    }
    match serde_json::from_str::<Value>(body) {
        Ok(json) => serde_json::to_string_pretty(&json).unwrap_or_else(|_| body.to_string()),
        Err(_) => body.to_string(),
    }
}

// ── Client ───────────────────────────────────────────────────────────────

/// HTTP client for a chat-completions vision endpoint.
///
/// Holds the configuration it was built with; the credential is never
/// re-read from the environment.
#[derive(Debug, Clone)]
pub struct VlmClient {
    http: reqwest::Client,
    config: ProcessorConfig,
}

impl VlmClient {
    pub fn new(config: ProcessorConfig) -> Result<Self, DocprocError> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.api_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder
            .build()
            .map_err(|e| DocprocError::HttpClient(e.to_string()))?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    /// Send `image` with `prompt` and parse the model's JSON reply.
    ///
    /// # Errors
    /// * [`FileError::MissingApiKey`] — no credential; nothing is sent
    /// * [`FileError::ApiCall`] — transport failure, non-2xx, or no content
    /// * [`FileError::ResponseFormat`] — content is not JSON after fence stripping
    pub async fn extract(&self, image: &NormalizedImage, prompt: &str) -> Result<Value, FileError> {
        let token = self.config.bearer_token().ok_or(FileError::MissingApiKey)?;

        let data_uri = to_data_uri(image);
        let request = ChatRequest::new(&self.config.model, prompt, data_uri);

        let start = Instant::now();
        let response = self
            .http
            .post(&self.config.endpoint)
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .header(CONTENT_TYPE, "application/json")
            .header("HTTP-Referer", &self.config.referer)
            .header("X-Title", &self.config.app_title)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!("VLM request failed: {}", e);
                FileError::ApiCall {
                    status: e.status().map(|s| s.as_u16()),
                    detail: e.to_string(),
                }
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| FileError::ApiCall {
            status: Some(status.as_u16()),
            detail: format!("failed to read response body: {e}"),
        })?;
        debug!(
            "VLM replied HTTP {} with {} bytes in {:?}",
            status.as_u16(),
            body.len(),
            start.elapsed()
        );

        if !status.is_success() {
            warn!("VLM returned HTTP {}", status.as_u16());
            return Err(FileError::ApiCall {
                status: Some(status.as_u16()),
                detail: error_detail(&body),
            });
        }

        let content = first_message_content(&body).ok_or_else(|| FileError::ApiCall {
            status: Some(status.as_u16()),
            detail: NO_VALID_RESPONSE.to_string(),
        })?;

        parse_model_output(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_body_matches_chat_completions_shape() {
        let req = ChatRequest::new("some/model", "Classify", "data:image/png;base64,AAAA".into());
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(
            v,
            json!({
                "model": "some/model",
                "messages": [{
                    "role": "user",
                    "content": [
                        {"type": "text", "text": "Classify"},
                        {"type": "image_url", "image_url": {"url": "data:image/png;base64,AAAA"}}
                    ]
                }]
            })
        );
    }

    #[test]
    fn content_extracted_from_envelope() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"{}"}}]}"#;
        assert_eq!(first_message_content(body).as_deref(), Some("{}"));
    }

    #[test]
    fn malformed_envelopes_yield_none() {
        assert_eq!(first_message_content("{}"), None);
        assert_eq!(first_message_content(r#"{"choices":[]}"#), None);
        assert_eq!(first_message_content(r#"{"choices":[{}]}"#), None);
        assert_eq!(
            first_message_content(r#"{"choices":[{"message":{"content":null}}]}"#),
            None
        );
        assert_eq!(
            first_message_content(r#"{"choices":[{"message":{"content":[1]}}]}"#),
            None
        );
        assert_eq!(first_message_content("<html>"), None);
    }

    #[test]
    fn error_detail_prefers_json_then_text() {
        let pretty = error_detail(r#"{"error":{"message":"bad key"}}"#);
        assert!(pretty.contains("\"bad key\""));
        assert!(pretty.contains('\n'), "expected pretty-printed JSON");

        assert_eq!(error_detail("Bad Gateway"), "Bad Gateway");
        assert_eq!(error_detail(""), "No additional error detail.");
    }

    #[tokio::test]
    async fn missing_key_fails_before_sending() {
        // Unroutable endpoint: any attempt to connect would surface as ApiCall.
        let config = ProcessorConfig::builder()
            .endpoint("http://127.0.0.1:9/never")
            .build()
            .unwrap();
        let client = VlmClient::new(config).unwrap();
        let image = NormalizedImage {
            bytes: vec![1, 2, 3],
            media_type: "image/png".into(),
        };
        let err = client.extract(&image, "prompt").await.unwrap_err();
        assert_eq!(err, FileError::MissingApiKey);
    }
}
