use serde::{Deserialize, Serialize};

use super::repo_types::Diet;

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub preferences: Option<String>,
    #[serde(default)]
    pub diet: Option<Diet>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}
