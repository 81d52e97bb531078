use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{AuthResponse, LoginRequest, Profile, RefreshRequest, RegisterRequest},
    extractors::AuthUser,
    services,
};
use crate::{error::ApiResult, state::AppState};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
}

pub fn profile_routes() -> Router<AppState> {
    Router::new().route("/auth/profile", get(get_profile))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    let Json(payload) = payload?;
    let resp = services::register(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<AuthResponse>> {
    let Json(payload) = payload?;
    Ok(Json(services::login(&state, payload).await?))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    payload: Result<Json<RefreshRequest>, JsonRejection>,
) -> ApiResult<Json<AuthResponse>> {
    let Json(payload) = payload?;
    Ok(Json(services::refresh(&state, payload).await?))
}

#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Json<Profile>> {
    Ok(Json(services::profile(&state, user_id).await?))
}
