use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

/// Credentials and endpoints of the two generative backends.
#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub stability_api_key: String,
    pub stability_engine: String,
    pub stability_base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub ai: AiConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "chefmind".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "chefmind-users".into()),
            ttl_minutes: env_parse("JWT_TTL_MINUTES", 60),
            refresh_ttl_minutes: env_parse("JWT_REFRESH_TTL_MINUTES", 60 * 24 * 14),
        };
        let ai = AiConfig {
            gemini_api_key: std::env::var("GEMINI_API_KEY").context("GEMINI_API_KEY must be set")?,
            gemini_model: std::env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| "gemini-1.5-flash-latest".into()),
            gemini_base_url: std::env::var("GEMINI_BASE_URL")
                .unwrap_or_else(|_| "https://generativelanguage.googleapis.com".into()),
            stability_api_key: std::env::var("STABILITY_API_KEY")
                .context("STABILITY_API_KEY must be set")?,
            stability_engine: std::env::var("STABILITY_ENGINE")
                .unwrap_or_else(|_| "stable-diffusion-xl-1024-v1-0".into()),
            stability_base_url: std::env::var("STABILITY_BASE_URL")
                .unwrap_or_else(|_| "https://api.stability.ai".into()),
            timeout_secs: env_parse("AI_TIMEOUT_SECS", 60),
        };
        Ok(Self {
            database_url,
            jwt,
            ai,
        })
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}
