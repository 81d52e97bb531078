use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::{api_error, AiError, ImageGenerator};
use crate::config::AiConfig;
use crate::recipes::repo_types::Diet;

const CFG_SCALE: f32 = 7.0;
const IMAGE_SIDE: u32 = 1024;
const STEPS: u32 = 30;

/// Stability AI text-to-image client.
#[derive(Clone)]
pub struct StabilityClient {
    http: reqwest::Client,
    base_url: String,
    engine: String,
    api_key: String,
}

impl StabilityClient {
    pub fn new(http: reqwest::Client, cfg: &AiConfig) -> Self {
        Self {
            http,
            base_url: cfg.stability_base_url.trim_end_matches('/').to_string(),
            engine: cfg.stability_engine.clone(),
            api_key: cfg.stability_api_key.clone(),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1/generation/{}/text-to-image",
            self.base_url, self.engine
        )
    }
}

#[derive(Debug, Serialize)]
struct TextPrompt {
    text: String,
    weight: f32,
}

#[derive(Debug, Serialize)]
struct TextToImageRequest {
    text_prompts: Vec<TextPrompt>,
    cfg_scale: f32,
    height: u32,
    width: u32,
    steps: u32,
    samples: u32,
}

#[derive(Debug, Deserialize)]
struct TextToImageResponse {
    #[serde(default)]
    artifacts: Vec<Artifact>,
}

#[derive(Debug, Deserialize)]
struct Artifact {
    base64: Option<String>,
}

fn image_request(title: &str, diet: Diet) -> TextToImageRequest {
    let mut text_prompts = vec![TextPrompt {
        text: format!(
            "Photorealistic food photography of \"{title}\", professional plating on a ceramic dish, \
             bright natural lighting, high detail, delicious and appetizing, shallow depth of field."
        ),
        weight: 1.0,
    }];
    let excluded = diet.excluded_foods();
    if !excluded.is_empty() {
        text_prompts.push(TextPrompt {
            text: excluded.join(", "),
            weight: -1.0,
        });
    }
    TextToImageRequest {
        text_prompts,
        cfg_scale: CFG_SCALE,
        height: IMAGE_SIDE,
        width: IMAGE_SIDE,
        steps: STEPS,
        samples: 1,
    }
}

#[async_trait]
impl ImageGenerator for StabilityClient {
    #[instrument(skip(self), fields(engine = %self.engine))]
    async fn generate_image(&self, title: &str, diet: Diet) -> Result<String, AiError> {
        let resp = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&image_request(title, diet))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(api_error(resp).await);
        }
        let parsed: TextToImageResponse = resp.json().await?;
        let b64 = parsed
            .artifacts
            .into_iter()
            .next()
            .and_then(|a| a.base64)
            .ok_or_else(|| AiError::Parse("stability response has no artifact".into()))?;
        debug!(bytes = b64.len(), "stability returned image");
        Ok(format!("data:image/png;base64,{b64}"))
    }
}
