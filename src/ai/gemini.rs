use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::{api_error, AiError, TextGenerator};
use crate::config::AiConfig;

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Google Gemini `generateContent` client.
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(http: reqwest::Client, cfg: &AiConfig) -> Self {
        Self {
            http,
            base_url: cfg.gemini_base_url.trim_end_matches('/').to_string(),
            model: cfg.gemini_model.clone(),
            api_key: cfg.gemini_api_key.clone(),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<TextPart<'a>>,
}

#[derive(Debug, Serialize)]
struct TextPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Text of the first part of the first candidate.
    fn into_text(self) -> Result<String, AiError> {
        self.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.text)
            .ok_or_else(|| AiError::Parse("gemini response has no candidate text".into()))
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    #[instrument(skip(self, prompt), fields(model = %self.model))]
    async fn generate_text(&self, prompt: &str) -> Result<String, AiError> {
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![TextPart { text: prompt }],
            }],
        };
        let resp = self
            .http
            .post(self.endpoint())
            .header(API_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(api_error(resp).await);
        }
        let parsed: GenerateContentResponse = resp.json().await?;
        let text = parsed.into_text()?;
        debug!(chars = text.len(), "gemini returned text");
        Ok(text)
    }
}
