use axum::extract::FromRef;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use super::dto::{AuthResponse, LoginRequest, Profile, RefreshRequest, RegisterRequest};
use super::jwt::JwtKeys;
use super::password::{hash_password, verify_password};
use super::repo::EmailTaken;
use super::repo_types::User;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

const MIN_PASSWORD_LEN: usize = 8;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn issue_tokens(keys: &JwtKeys, user: User) -> ApiResult<AuthResponse> {
    let access_token = keys.sign_access(user.id)?;
    let refresh_token = keys.sign_refresh(user.id)?;
    Ok(AuthResponse {
        access_token,
        refresh_token,
        user: user.into(),
    })
}

#[instrument(skip(state, payload))]
pub async fn register(state: &AppState, payload: RegisterRequest) -> ApiResult<AuthResponse> {
    let email = normalize_email(&payload.email);
    let name = payload.name.trim();

    if name.is_empty() {
        return Err(ApiError::Validation("Name is required".into()));
    }
    if !is_valid_email(&email) {
        warn!(%email, "invalid email");
        return Err(ApiError::Validation("Invalid email".into()));
    }
    if payload.password.len() < MIN_PASSWORD_LEN {
        warn!("password too short");
        return Err(ApiError::Validation("Password too short".into()));
    }

    if state.users.find_by_email(&email).await?.is_some() {
        warn!(%email, "email already registered");
        return Err(ApiError::Conflict("Email already registered".into()));
    }

    let hash = hash_password(&payload.password)?;
    let user = match state.users.create(name, &email, &hash).await {
        Ok(u) => u,
        // Lost a race with a concurrent registration of the same email.
        Err(e) if e.is::<EmailTaken>() => {
            return Err(ApiError::Conflict("Email already registered".into()));
        }
        Err(e) => {
            error!(error = %e, "create user failed");
            return Err(e.into());
        }
    };

    info!(user_id = %user.id, email = %user.email, "user registered");
    issue_tokens(&JwtKeys::from_ref(state), user)
}

#[instrument(skip(state, payload))]
pub async fn login(state: &AppState, payload: LoginRequest) -> ApiResult<AuthResponse> {
    let email = normalize_email(&payload.email);
    let invalid = || ApiError::Unauthorized("Invalid credentials".into());

    let Some(user) = state.users.find_by_email(&email).await? else {
        warn!(%email, "login unknown email");
        return Err(invalid());
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(%email, user_id = %user.id, "login invalid password");
        return Err(invalid());
    }

    info!(user_id = %user.id, email = %user.email, "user logged in");
    issue_tokens(&JwtKeys::from_ref(state), user)
}

#[instrument(skip(state, payload))]
pub async fn refresh(state: &AppState, payload: RefreshRequest) -> ApiResult<AuthResponse> {
    let keys = JwtKeys::from_ref(state);
    let claims = keys.verify_refresh(&payload.refresh_token).map_err(|e| {
        warn!(error = %e, "refresh rejected");
        ApiError::Unauthorized("Invalid or expired refresh token".into())
    })?;
    let user = state
        .users
        .find_by_id(claims.sub)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("User not found".into()))?;
    issue_tokens(&keys, user)
}

#[instrument(skip(state))]
pub async fn profile(state: &AppState, user_id: Uuid) -> ApiResult<Profile> {
    match state.users.find_by_id(user_id).await? {
        Some(user) => Ok(user.into()),
        None => {
            warn!(%user_id, "token for unknown user");
            Err(ApiError::Unauthorized("User not found".into()))
        }
    }
}
