//! Gemini `generateContent` proxy client
//!
//! The API key stays server-side: it travels in the `x-goog-api-key`
//! header and never appears in logs or error messages.

use std::time::Duration;

use serde_json::{Value, json};
use thiserror::Error;

use crate::config::GeminiSettings;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum GeminiError {
    #[error("Gemini request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Gemini returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Gemini response is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Gemini response had no text candidate")]
    EmptyResponse,
}

#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    api_url: String,
}

impl GeminiClient {
    pub fn new(settings: &GeminiSettings) -> Result<Self, GeminiError> {
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
            api_url: settings.api_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send a single-turn prompt and return the first candidate's text
    pub async fn generate(&self, prompt: &str) -> Result<String, GeminiError> {
        let url = format!("{}/models/{}:generateContent", self.api_url, self.model);
        let payload = json!({
            "contents": [{
                "parts": [{ "text": prompt }]
            }]
        });

        tracing::info!(model = %self.model, prompt_chars = prompt.chars().count(), "Gemini request");
        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| GeminiError::Http(e.without_url()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| GeminiError::Http(e.without_url()))?;

        if !status.is_success() {
            let message = error_message(&text);
            tracing::warn!(status = status.as_u16(), %message, "Gemini error response");
            return Err(GeminiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body: Value = serde_json::from_str(&text)?;
        extract_text(&body).ok_or(GeminiError::EmptyResponse)
    }
}

/// `error.message` of a JSON error body, otherwise the start of the raw body
fn error_message(text: &str) -> String {
    if let Ok(body) = serde_json::from_str::<Value>(text)
        && let Some(message) = body["error"]["message"].as_str()
    {
        return message.to_string();
    }
    let snippet: String = text.trim().chars().take(200).collect();
    if snippet.is_empty() {
        "empty response body".to_string()
    } else {
        snippet
    }
}

/// `candidates[0].content.parts[*].text`, concatenated
fn extract_text(body: &Value) -> Option<String> {
    let parts = body["candidates"][0]["content"]["parts"].as_array()?;
    let text: String = parts.iter().filter_map(|p| p["text"].as_str()).collect();
    (!text.is_empty()).then_some(text)
}
