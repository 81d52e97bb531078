//! Canned adapters for tests. They count calls so tests can assert that
//! validation short-circuits before any upstream request.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::{AiError, ImageGenerator, TextGenerator};
use crate::recipes::repo_types::Diet;

pub const FAKE_IMAGE_URL: &str = "https://images.test/dish.png";

pub const FAKE_RECIPE_JSON: &str = "```json\n{\"title\":\"X\",\"ingredients\":[{\"name\":\"egg\",\"quantity\":\"2\"},{\"name\":\"flour\",\"quantity\":\"100 g\"}],\"instructions\":\"1. a\\n2. b\"}\n```";

#[derive(Debug)]
pub struct FakeText {
    response: Result<String, String>,
    calls: AtomicUsize,
}

impl FakeText {
    pub fn returning(text: &str) -> Self {
        Self {
            response: Ok(text.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            response: Err(message.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextGenerator for FakeText {
    async fn generate_text(&self, _prompt: &str) -> Result<String, AiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.response.clone().map_err(|message| AiError::Api {
            status: 503,
            message,
        })
    }
}

#[derive(Debug, Default)]
pub struct FakeImage {
    fail: bool,
    calls: AtomicUsize,
}

impl FakeImage {
    pub fn failing() -> Self {
        Self {
            fail: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageGenerator for FakeImage {
    async fn generate_image(&self, _title: &str, _diet: Diet) -> Result<String, AiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(AiError::Request("connection reset".into()));
        }
        Ok(FAKE_IMAGE_URL.to_string())
    }
}

/// Serves `router` on an ephemeral local port and returns its base URL.
pub async fn serve_stub(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

/// Adapter config pointing both APIs at `base_url`.
pub fn stub_config(base_url: &str, timeout_secs: u64) -> crate::config::AiConfig {
    crate::config::AiConfig {
        gemini_api_key: "gemini-secret".into(),
        gemini_model: "m".into(),
        gemini_base_url: base_url.into(),
        stability_api_key: "stability-secret".into(),
        stability_engine: "sdxl".into(),
        stability_base_url: base_url.into(),
        timeout_secs,
    }
}
