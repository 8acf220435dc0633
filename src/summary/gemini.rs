use super::Summarizer;
use crate::config::SummaryConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// Google Generative Language `generateContent` client.
pub struct GeminiSummarizer {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    system_instruction: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate.
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| {
                c.parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

impl GeminiSummarizer {
    pub fn new(api_key: String, config: &SummaryConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            client,
            api_key,
            base_url: config.api_base.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            system_instruction: config.system_instruction.clone(),
        })
    }

    fn request_body(&self, prompt: &str) -> serde_json::Value {
        serde_json::json!({
            "contents": [{"role": "user", "parts": [{"text": prompt}]}],
            "systemInstruction": {"parts": [{"text": self.system_instruction}]},
        })
    }
}

#[async_trait]
impl Summarizer for GeminiSummarizer {
    async fn summarize(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);

        // The key travels in a header and reqwest errors are stripped of
        // their URL, so neither ends up in the log.
        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&self.request_body(prompt))
            .send()
            .await
            .map_err(reqwest::Error::without_url)
            .context("gemini request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("gemini {} ({}): {}", self.model, status, body);
        }

        let parsed: GenerateContentResponse = resp
            .json()
            .await
            .map_err(reqwest::Error::without_url)
            .context("failed to parse gemini response")?;

        let text = parsed.text();
        tracing::debug!(model = %self.model, chars = text.len(), "summary received");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SummaryConfig {
        SummaryConfig {
            api_base: "https://example.test/v1beta/".to_string(),
            model: "gemini-test".to_string(),
            system_instruction: "Be brief.".to_string(),
            max_posts: 10,
            request_timeout_ms: 1000,
        }
    }

    #[test]
    fn test_response_text_joins_parts() {
        let raw = r#"{"candidates":[{"content":{"parts":[{"text":"Hello "},{"text":"world"}]}}]}"#;
        let parsed: GenerateContentResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.text(), "Hello world");
    }

    #[test]
    fn test_response_without_candidates_is_empty() {
        let parsed: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed.text(), "");
    }

    #[test]
    fn test_request_body_carries_system_instruction() {
        let s = GeminiSummarizer::new("key".to_string(), &config()).unwrap();
        assert_eq!(s.base_url, "https://example.test/v1beta");
        let body = s.request_body("summarize this");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "summarize this");
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "Be brief.");
    }

    #[tokio::test]
    async fn test_transport_error_does_not_leak_key() {
        let config = SummaryConfig {
            api_base: "http://127.0.0.1:1/v1beta".to_string(),
            ..config()
        };
        let s = GeminiSummarizer::new("SECRET123".to_string(), &config).unwrap();
        let err = s.summarize("hi").await.unwrap_err();
        let text = format!("{:#}", err);
        assert!(text.contains("gemini request failed"));
        assert!(!text.contains("SECRET123"), "key leaked: {}", text);
    }
}
