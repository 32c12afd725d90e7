//! Gemini integration -- text generation via the `generateContent` endpoint.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;
use url::Url;

use super::traits::CompletionClient;
use crate::error::CompletionError;
use crate::storage::ApiConfig;

pub struct GeminiClient {
    http: Client,
    base_url: String,
    model: String,
}

impl GeminiClient {
    pub fn new(config: &ApiConfig) -> Result<Self, CompletionError> {
        let http = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            model: config.model.clone(),
        })
    }

    /// `{base}/models/{model}:generateContent?key={secret}`
    fn endpoint(&self, secret: &str) -> Result<Url, CompletionError> {
        let raw = format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        );
        let mut url = Url::parse(&raw).map_err(|e| CompletionError::InvalidEndpoint(e.to_string()))?;
        url.query_pairs_mut().append_pair("key", secret);
        Ok(url)
    }
}

#[async_trait]
impl CompletionClient for GeminiClient {
    async fn complete(&self, secret: &str, prompt: &str) -> Result<String, CompletionError> {
        let body = json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": prompt }]
            }]
        });

        debug!(model = %self.model, prompt_chars = prompt.len(), "requesting completion");
        let resp = self
            .http
            .post(self.endpoint(secret)?)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|v| {
                    v.pointer("/error/message")
                        .and_then(Value::as_str)
                        .map(String::from)
                })
                .unwrap_or_else(|| format!("API request failed (HTTP {status})"));
            debug!(%status, "completion request rejected");
            return Err(CompletionError::Remote { message });
        }

        let text = resp.text().await?;
        let data: Value = serde_json::from_str(&text)
            .map_err(|e| CompletionError::MalformedResponse(e.to_string()))?;

        data.pointer("/candidates/0/content/parts/0/text")
            .and_then(Value::as_str)
            .map(String::from)
            .ok_or_else(|| {
                CompletionError::MalformedResponse("no generated text in response".into())
            })
    }
}
