//! Adapters for the external generative APIs.
//!
//! Each adapter wraps exactly one HTTP call with fixed parameters. There is no
//! retry or backoff; any failure surfaces as an [`AiError`].

pub mod gemini;
pub mod stability;

#[cfg(test)]
pub mod fake;

use std::time::Duration;

use async_trait::async_trait;

use crate::config::AiConfig;
use crate::recipes::repo_types::Diet;

#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("api returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("unexpected response: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for AiError {
    fn from(e: reqwest::Error) -> Self {
        // The request URL never ends up in logs.
        if e.is_decode() {
            AiError::Parse(e.without_url().to_string())
        } else {
            AiError::Request(e.without_url().to_string())
        }
    }
}

/// Text model producing the recipe JSON.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate_text(&self, prompt: &str) -> Result<String, AiError>;
}

/// Image model producing a picture of the finished dish.
///
/// Returns something usable as an `<img src>`: a data URI or a link.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate_image(&self, title: &str, diet: Diet) -> Result<String, AiError>;
}

/// Shared outbound client; the timeout is the only cancellation we apply.
pub fn http_client(cfg: &AiConfig) -> anyhow::Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(cfg.timeout_secs))
        .build()?;
    Ok(client)
}

/// Reads a non-2xx response into an [`AiError::Api`].
pub(crate) async fn api_error(resp: reqwest::Response) -> AiError {
    let status = resp.status().as_u16();
    let message = resp
        .text()
        .await
        .unwrap_or_else(|e| format!("<unreadable body: {e}>"));
    AiError::Api { status, message }
}
