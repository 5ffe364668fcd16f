use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;

use crate::config::AiConfig;

/// Black-box text completion: prompt in, text out.
#[async_trait]
pub trait Assistant: Send + Sync {
    async fn complete(&self, prompt: &str) -> anyhow::Result<String>;
}

/// Google Gemini `generateContent` over REST.
pub struct GeminiAssistant {
    api_key: Option<String>,
    endpoint: String,
    client: reqwest::Client,
}

impl GeminiAssistant {
    pub fn new(cfg: &AiConfig) -> Self {
        Self {
            api_key: cfg.api_key.clone(),
            endpoint: format!(
                "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
                cfg.model
            ),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Assistant for GeminiAssistant {
    async fn complete(&self, prompt: &str) -> anyhow::Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .context("GEMINI_API_KEY not configured")?;

        let payload = serde_json::json!({
            "contents": [{
                "parts": [{ "text": prompt }]
            }]
        });

        let resp = self
            .client
            .post(&self.endpoint)
            .query(&[("key", api_key)])
            .json(&payload)
            .timeout(Duration::from_secs(30))
            .send()
            .await
            .context("gemini request")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Gemini API error {}: {}", status, body);
        }

        let body: serde_json::Value = resp.json().await.context("gemini response body")?;
        extract_text(&body)
    }
}

fn extract_text(body: &serde_json::Value) -> anyhow::Result<String> {
    let text = body["candidates"][0]["content"]["parts"][0]["text"]
        .as_str()
        .context("gemini response has no text part")?
        .trim();
    anyhow::ensure!(!text.is_empty(), "gemini returned empty text");
    Ok(text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_first_candidate_text() {
        let body = json!({
            "candidates": [{ "content": { "parts": [{ "text": "  The tank is half full. \n" }] } }]
        });
        assert_eq!(extract_text(&body).unwrap(), "The tank is half full.");
    }

    #[test]
    fn malformed_or_empty_responses_are_errors() {
        assert!(extract_text(&json!({})).is_err());
        assert!(extract_text(&json!({ "candidates": [] })).is_err());
        let blank = json!({ "candidates": [{ "content": { "parts": [{ "text": "   " }] } }] });
        assert!(extract_text(&blank).is_err());
    }

    #[tokio::test]
    async fn missing_key_fails_without_network() {
        let assistant = GeminiAssistant::new(&AiConfig {
            api_key: None,
            model: "gemini-2.0-flash".into(),
        });
        let err = assistant.complete("hello").await.unwrap_err();
        assert!(err.to_string().contains("GEMINI_API_KEY"));
    }
}
