//! Gemini `generateContent` over blocking HTTP.

use super::{ModelClient, ModelRequest, Part};
use crate::error::{Error, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::blocking::Client as HttpClient;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use serde_json::{json, Value};
use std::fs;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Client for the Gemini REST API.
pub struct GeminiClient {
    http: HttpClient,
    api_key: String,
    api_base: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default, rename = "promptFeedback")]
    prompt_feedback: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default, rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<ReplyPart>,
}

#[derive(Debug, Deserialize)]
struct ReplyPart {
    #[serde(default)]
    text: Option<String>,
}

impl GeminiClient {
    pub fn new(
        api_key: impl Into<String>,
        api_base: Option<&str>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Model(format!("cannot build HTTP client: {}", e)))?;
        Ok(Self {
            http,
            api_key: api_key.into(),
            api_base: api_base
                .unwrap_or(DEFAULT_API_BASE)
                .trim_end_matches('/')
                .to_string(),
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.api_base, model)
    }

    fn payload(request: &ModelRequest) -> Result<Value> {
        let mut parts = Vec::with_capacity(request.parts.len());
        for part in &request.parts {
            match part {
                Part::Text(text) => parts.push(json!({ "text": text })),
                Part::Document { mime, path } => {
                    let bytes = fs::read(path)?;
                    debug!(path = %path.display(), bytes = bytes.len(), "attaching document");
                    parts.push(json!({
                        "inline_data": {
                            "mime_type": mime,
                            "data": BASE64.encode(bytes),
                        }
                    }));
                }
            }
        }
        Ok(json!({
            "contents": [{ "role": "user", "parts": parts }],
        }))
    }
}

/// Concatenated text of the first candidate.
fn reply_text(response: GenerateResponse) -> Result<String> {
    let Some(candidate) = response.candidates.into_iter().next() else {
        let reason = response
            .prompt_feedback
            .map(|f| f.to_string())
            .unwrap_or_else(|| "no candidates returned".to_string());
        return Err(Error::Model(reason));
    };

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();
    if text.trim().is_empty() {
        warn!(
            finish_reason = candidate.finish_reason.as_deref().unwrap_or("unknown"),
            "model returned an empty reply"
        );
    }
    Ok(text)
}

impl ModelClient for GeminiClient {
    fn generate(&self, request: &ModelRequest) -> Result<String> {
        let payload = Self::payload(request)?;
        info!(model = %request.model, parts = request.parts.len(), "calling model");

        let response = self
            .http
            .post(self.endpoint(&request.model))
            .header("x-goog-api-key", &self.api_key)
            .header(CONTENT_TYPE, "application/json")
            .json(&payload)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(Error::Model(format!("HTTP {}: {}", status, body.trim())));
        }

        let parsed: GenerateResponse = response.json()?;
        reply_text(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_text_joins_parts() {
        let response: GenerateResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {"parts": [{"text": "```json\n"}, {"text": "{}\n```"}]},
                "finishReason": "STOP"
            }]
        }))
        .unwrap();
        assert_eq!(reply_text(response).unwrap(), "```json\n{}\n```");
    }

    #[test]
    fn test_candidate_without_text_is_empty_reply() {
        let response: GenerateResponse = serde_json::from_value(json!({
            "candidates": [{"content": {"parts": []}, "finishReason": "MAX_TOKENS"}]
        }))
        .unwrap();
        assert_eq!(reply_text(response).unwrap(), "");
    }

    #[test]
    fn test_reply_without_candidates() {
        let response: GenerateResponse = serde_json::from_value(json!({
            "promptFeedback": {"blockReason": "SAFETY"}
        }))
        .unwrap();
        let err = reply_text(response).unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }

    #[test]
    fn test_payload_inlines_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = dir.path().join("deck.pdf");
        fs::write(&pdf, b"%PDF-1.4").unwrap();

        let request = ModelRequest::new("gemini-2.5-flash").text("hello").pdf(&pdf);
        let payload = GeminiClient::payload(&request).unwrap();
        let parts = &payload["contents"][0]["parts"];
        assert_eq!(parts[0]["text"], "hello");
        assert_eq!(parts[1]["inline_data"]["mime_type"], "application/pdf");
        assert_eq!(parts[1]["inline_data"]["data"], BASE64.encode(b"%PDF-1.4"));
    }

    #[test]
    fn test_endpoint() {
        let client =
            GeminiClient::new("key", Some("http://localhost:8080/v1/"), Duration::from_secs(5))
                .unwrap();
        assert_eq!(
            client.endpoint("gemini-2.5-flash"),
            "http://localhost:8080/v1/models/gemini-2.5-flash:generateContent"
        );
    }
}
