use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::Json;
use axum::Extension;
use chrono::{DateTime, Utc};
use rusqlite::TransactionBehavior;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::auth::{self, CurrentUser, TokenPair};
use crate::db::queries::users;
use crate::error::{ApiJson, AppError, AppResult};
use crate::models::{NewUser, User};
use crate::state::AppState;

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub async fn signup(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<SignupRequest>,
) -> AppResult<(StatusCode, Json<TokenPair>)> {
    let email = normalize_email(&body.email);
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::Validation("A valid email is required".into()));
    }
    if body.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    let conn = state.db.get()?;
    if users::find_user_by_email(&conn, &email)?.is_some() {
        return Err(AppError::Conflict("Email is already registered".into()));
    }

    let password_hash = auth::hash_password(&body.password)?;
    let name = body
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());
    let id = users::create_user(
        &conn,
        &NewUser {
            email,
            password_hash,
            name,
        },
    )?;
    let user = users::get_user(&conn, id)?
        .ok_or_else(|| AppError::Internal("User vanished after signup".into()))?;

    let tokens = auth::issue_tokens(&state, &conn, user)?;
    info!(user_id = id, "User signed up");
    Ok((StatusCode::CREATED, Json(tokens)))
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> AppResult<Json<TokenPair>> {
    let email = normalize_email(&body.email);
    let conn = state.db.get()?;

    let user = users::find_user_by_email(&conn, &email)?
        .filter(|user| auth::verify_password(&body.password, &user.password_hash))
        .ok_or_else(|| {
            warn!("Failed login attempt");
            AppError::Unauthorized("Invalid email or password".into())
        })?;

    users::delete_expired_refresh_tokens(&conn, &Utc::now().to_rfc3339())?;

    let user_id = user.id;
    let tokens = auth::issue_tokens(&state, &conn, user)?;
    info!(user_id, "User logged in");
    Ok(Json(tokens))
}

/// Exchange a refresh token for a new token pair. The presented refresh token
/// is consumed.
pub async fn refresh(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RefreshRequest>,
) -> AppResult<Json<TokenPair>> {
    let mut conn = state.db.get()?;
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let stored = users::find_refresh_token(&tx, &body.refresh_token)?
        .ok_or_else(|| AppError::Unauthorized("Invalid refresh token".into()))?;

    users::delete_refresh_token(&tx, &stored.token)?;

    let expired = DateTime::parse_from_rfc3339(&stored.expires_at)
        .map(|at| at.with_timezone(&Utc) <= Utc::now())
        .unwrap_or(true);
    if expired {
        tx.commit()?;
        debug!(user_id = stored.user_id, "Rejected expired refresh token");
        return Err(AppError::Unauthorized("Refresh token expired".into()));
    }

    let user = users::get_user(&tx, stored.user_id)?
        .ok_or_else(|| AppError::Unauthorized("Invalid refresh token".into()))?;
    let tokens = auth::issue_tokens(&state, &tx, user)?;

    tx.commit()?;
    debug!(user_id = stored.user_id, "Rotated refresh token");
    Ok(Json(tokens))
}

pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(body): ApiJson<RefreshRequest>,
) -> AppResult<Json<Value>> {
    if let Some(token) = auth::bearer_token(&headers) {
        state.sessions.revoke(token);
    }

    let conn = state.db.get()?;
    users::delete_refresh_token(&conn, &body.refresh_token)?;

    Ok(Json(json!({ "message": "Logged out" })))
}

pub async fn me(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> AppResult<Json<User>> {
    let conn = state.db.get()?;
    let user = users::get_user(&conn, user.id)?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    Ok(Json(user))
}
