use super::{ProviderError, TextGenerator};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_base: String,
    pub api_key: String,
    pub model: String,
}

pub struct GeminiGenerator {
    config: GeminiConfig,
    client: reqwest::Client,
}

impl GeminiGenerator {
    pub fn new(config: GeminiConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    fn api_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.api_base.trim_end_matches('/'),
            self.config.model
        )
    }
}

#[async_trait]
impl TextGenerator for GeminiGenerator {
    async fn generate(&self, message: &str) -> Result<String, ProviderError> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(message.to_string()),
                }],
            }],
        };

        tracing::debug!(
            model = %self.config.model,
            message_len = message.len(),
            "sending request to Gemini"
        );

        // The key travels in a header so it never shows up in logged URLs
        let result = self
            .client
            .post(self.api_url())
            .header("x-goog-api-key", &self.config.api_key)
            .json(&request)
            .send()
            .await;

        let res = match result {
            Ok(res) => res,
            Err(e) => return Err(ProviderError::Network(e.to_string())),
        };

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(ProviderError::Api(format!("Gemini returned {status}: {body}")));
        }

        match res.json::<GenerateContentResponse>().await {
            Ok(body) => reply_text(body),
            Err(e) => Err(ProviderError::Api(format!("Parse error: {e}"))),
        }
    }
}

// Concatenate the text parts of the first candidate
fn reply_text(body: GenerateContentResponse) -> Result<String, ProviderError> {
    let candidate = body
        .candidates
        .into_iter()
        .next()
        .ok_or(ProviderError::EmptyReply)?;

    let text: String = candidate
        .content
        .map(|c| c.parts)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|p| p.text)
        .collect();

    if text.is_empty() {
        return Err(ProviderError::EmptyReply);
    }
    Ok(text)
}

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}
