//! Text-generation transport.
//!
//! Every provider wraps the generated text in its own JSON envelope. The
//! envelope is peeled off in exactly one place, [`unwrap_envelope`], so the
//! nutrition schema underneath is validated once regardless of provider.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::config::Config;

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("text-generation service returned status {status}")]
    Status { status: u16, body: String },

    #[error("text-generation request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unrecognized response envelope")]
    Envelope,

    #[error("text-generation API key is not configured")]
    NotConfigured,
}

#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Send a system instruction plus user text, returning the generated text.
    async fn complete(&self, system: &str, user: &str) -> Result<String, BackendError>;
}

/// Google Generative Language `generateContent` client.
pub struct GeminiBackend {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiBackend {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            model: model.into(),
            api_key: api_key.into(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        Self::new(
            config.gemini_base_url.clone(),
            config.gemini_model.clone(),
            config.gemini_api_key.clone(),
            config.parser_timeout(),
        )
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

#[async_trait]
impl CompletionBackend for GeminiBackend {
    async fn complete(&self, system: &str, user: &str) -> Result<String, BackendError> {
        if self.api_key.is_empty() {
            return Err(BackendError::NotConfigured);
        }

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&json!({
                "contents": [{
                    "parts": [
                        { "text": system },
                        { "text": user }
                    ]
                }],
                "generationConfig": {
                    "temperature": 0.7,
                    "maxOutputTokens": 2048
                }
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), body = %body, "text-generation API error");
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: Value = response.json().await?;
        unwrap_envelope(&envelope).ok_or(BackendError::Envelope)
    }
}

/// Extract the generated text from a provider response.
///
/// Accepts the `generateContent` shape (`candidates[0].content.parts[*].text`),
/// the chat-completion shape (`choices[0].message.content`), the messages-API
/// shape (`content[0].text`) and a bare JSON array, which some gateways return
/// already decoded.
pub fn unwrap_envelope(envelope: &Value) -> Option<String> {
    if envelope.is_array() {
        return Some(envelope.to_string());
    }

    if let Some(parts) = envelope
        .pointer("/candidates/0/content/parts")
        .and_then(Value::as_array)
    {
        let text: String = parts
            .iter()
            .filter_map(|p| p.get("text").and_then(Value::as_str))
            .collect();
        if !text.is_empty() {
            return Some(text);
        }
    }

    envelope
        .pointer("/choices/0/message/content")
        .or_else(|| envelope.pointer("/content/0/text"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const MODEL_PATH: &str = "/v1beta/models/gemini-1.5-flash:generateContent";

    fn backend_for(server: &MockServer) -> GeminiBackend {
        GeminiBackend::new(
            server.uri(),
            "gemini-1.5-flash",
            "test-key",
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn test_unwrap_generate_content_envelope() {
        let envelope = json!({
            "candidates": [{
                "content": { "parts": [{ "text": "[{\"food_name\":" }, { "text": "\"Apple\"}]" }] }
            }]
        });
        assert_eq!(
            unwrap_envelope(&envelope).as_deref(),
            Some("[{\"food_name\":\"Apple\"}]")
        );
    }

    #[test]
    fn test_unwrap_chat_completion_envelope() {
        let envelope = json!({
            "choices": [{ "message": { "role": "assistant", "content": "[]" } }]
        });
        assert_eq!(unwrap_envelope(&envelope).as_deref(), Some("[]"));
    }

    #[test]
    fn test_unwrap_messages_envelope() {
        let envelope = json!({ "content": [{ "type": "text", "text": "```json\n[]\n```" }] });
        assert_eq!(unwrap_envelope(&envelope).as_deref(), Some("```json\n[]\n```"));
    }

    #[test]
    fn test_unwrap_bare_array() {
        let envelope = json!([{ "food_name": "Rice" }]);
        let text = unwrap_envelope(&envelope).unwrap();
        let reparsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(reparsed, envelope);
    }

    #[test]
    fn test_unwrap_unknown_envelope() {
        assert!(unwrap_envelope(&json!({ "error": "nope" })).is_none());
        assert!(unwrap_envelope(&json!({ "candidates": [] })).is_none());
    }

    #[tokio::test]
    async fn test_complete_returns_generated_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(MODEL_PATH))
            .and(query_param("key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{ "content": { "parts": [{ "text": "[]" }] } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let text = backend_for(&server).complete("system", "an apple").await.unwrap();
        assert_eq!(text, "[]");
    }

    #[tokio::test]
    async fn test_complete_surfaces_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(MODEL_PATH))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .mount(&server)
            .await;

        let err = backend_for(&server).complete("system", "an apple").await.unwrap_err();
        match err {
            BackendError::Status { status, body } => {
                assert_eq!(status, 429);
                assert_eq!(body, "slow down");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_complete_rejects_unknown_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(MODEL_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "promptFeedback": {} })))
            .mount(&server)
            .await;

        let err = backend_for(&server).complete("system", "an apple").await.unwrap_err();
        assert!(matches!(err, BackendError::Envelope));
    }

    #[tokio::test]
    async fn test_complete_without_key_is_not_configured() {
        let backend =
            GeminiBackend::new("http://localhost:1", "m", "", Duration::from_secs(1)).unwrap();
        let err = backend.complete("system", "text").await.unwrap_err();
        assert!(matches!(err, BackendError::NotConfigured));
    }
}
