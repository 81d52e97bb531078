use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        DefaultBodyLimit, Path, State,
    },
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::dto::{GenerateRequest, MessageResponse};
use super::repo_types::{Recipe, RecipeDraft};
use super::services;
use crate::{auth::extractors::AuthUser, error::ApiResult, state::AppState};

/// Saved recipes may carry a base64 image, so the save body is allowed to be large.
const SAVE_BODY_LIMIT: usize = 10 * 1024 * 1024;

pub fn public_routes() -> Router<AppState> {
    Router::new().route("/recipe/generate", post(generate))
}

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/recipe/history", get(history))
        .route("/recipe/:id", get(get_recipe).delete(delete_recipe))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/recipe/save", post(save))
        .layer(DefaultBodyLimit::max(SAVE_BODY_LIMIT))
}

#[instrument(skip(state, payload))]
pub async fn generate(
    State(state): State<AppState>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> ApiResult<Json<RecipeDraft>> {
    let Json(req) = payload?;
    let draft = services::generate_recipe(state.text.as_ref(), state.image.as_ref(), req).await?;
    Ok(Json(draft))
}

#[instrument(skip(state, payload))]
pub async fn save(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    payload: Result<Json<RecipeDraft>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Recipe>)> {
    let Json(draft) = payload?;
    let recipe = services::save_recipe(&state, user_id, draft).await?;
    Ok((StatusCode::CREATED, Json(recipe)))
}

#[instrument(skip(state))]
pub async fn history(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Json<Vec<Recipe>>> {
    Ok(Json(services::list_history(&state, user_id).await?))
}

#[instrument(skip(state))]
pub async fn get_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<Recipe>> {
    let Path(id) = id?;
    Ok(Json(services::get_owned_recipe(&state, user_id, id).await?))
}

#[instrument(skip(state))]
pub async fn delete_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let Path(id) = id?;
    services::delete_owned_recipe(&state, user_id, id).await?;
    Ok(Json(MessageResponse {
        message: "Recipe removed successfully.",
    }))
}
