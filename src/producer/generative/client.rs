//! HTTP client for the text-generation service.

use super::error::GenerationError;
use serde::Deserialize;
use serde_json::json;
use std::{future::Future, time::Duration};

/// Public endpoint of the generation service.
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com";

/// Produces text from an instruction and a prompt.
pub trait TextGenerator: Send + Sync {
    fn generate(
        &self,
        model: &str,
        system_instruction: &str,
        prompt: &str,
    ) -> impl Future<Output = Result<String, GenerationError>> + Send;
}

/// `generateContent` client authenticated with an API key.
#[derive(Debug, Clone)]
pub struct TextGenerationClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

impl TextGenerationClient {
    /// Client for `endpoint`; a missing or blank key fails every request.
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>) -> Result<Self, GenerationError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(15))
            .timeout(Duration::from_secs(180))
            .build()?;
        Ok(Self {
            http,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        })
    }

    fn url(&self, model: &str) -> String {
        format!("{}/v1beta/models/{model}:generateContent", self.endpoint)
    }
}

impl TextGenerator for TextGenerationClient {
    async fn generate(
        &self,
        model: &str,
        system_instruction: &str,
        prompt: &str,
    ) -> Result<String, GenerationError> {
        let api_key = self.api_key.as_deref().ok_or(GenerationError::MissingApiKey)?;
        let body = json!({
            "systemInstruction": { "parts": [{ "text": system_instruction }] },
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
        });

        let response = self
            .http
            .post(self.url(model))
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&text)
                .map(|e| e.error.message)
                .unwrap_or(text);
            return Err(GenerationError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GenerateResponse = response.json().await?;
        let text: String = parsed
            .candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .filter_map(|p| p.text)
            .collect();
        if text.trim().is_empty() {
            return Err(GenerationError::Empty);
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_trailing_slash_is_ignored() {
        let client = TextGenerationClient::new("http://localhost:1/", Some("k".into())).unwrap();
        assert_eq!(
            client.url("gemini-2.5-flash"),
            "http://localhost:1/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[tokio::test]
    async fn blank_key_fails_without_a_request() {
        let client = TextGenerationClient::new("http://localhost:1", Some("  ".into())).unwrap();
        let err = client.generate("m", "s", "p").await.unwrap_err();
        assert!(matches!(err, GenerationError::MissingApiKey));
    }
}
