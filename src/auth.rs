//! Bearer-token authentication.
//!
//! Passwords are stored as Argon2id hashes. Logging in issues a short-lived
//! access token, held in an in-process session store, and a long-lived refresh
//! token persisted in `refresh_tokens`. Access tokens are invalidated on
//! logout, on expiry, or when the server restarts.
//!
//! [`require_user`] resolves `Authorization: Bearer <token>` into a
//! [`CurrentUser`] request extension. Handlers read it and pass the user id
//! explicitly into every service call.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use axum::body::Body;
use axum::extract::State;
use axum::http::{header, HeaderMap, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Duration, Utc};
use rusqlite::Connection;
use serde::Serialize;
use uuid::Uuid;

use crate::db::queries::users;
use crate::error::{AppError, AppResult};
use crate::models::User;
use crate::state::AppState;

/// Identity of the caller, attached to the request by [`require_user`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: i64,
}

#[derive(Debug, Clone)]
struct Session {
    user_id: i64,
    expires_at: DateTime<Utc>,
}

/// Server-side store of live access tokens.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    sessions: Arc<Mutex<HashMap<String, Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new access token for `user_id` valid for `ttl`. Expired
    /// sessions are swept out first.
    pub fn issue(&self, user_id: i64, ttl: Duration) -> String {
        let now = Utc::now();
        let token = Uuid::new_v4().to_string();
        let session = Session {
            user_id,
            expires_at: now + ttl,
        };

        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        sessions.retain(|_, s| s.expires_at > now);
        sessions.insert(token.clone(), session);
        token
    }

    /// Number of sessions currently held.
    pub fn len(&self) -> usize {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolve a token to its user. Expired tokens are dropped.
    pub fn resolve(&self, token: &str) -> Option<i64> {
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        match sessions.get(token) {
            Some(session) if session.expires_at > Utc::now() => Some(session.user_id),
            Some(_) => {
                sessions.remove(token);
                None
            }
            None => None,
        }
    }

    pub fn revoke(&self, token: &str) -> bool {
        self.sessions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(token)
            .is_some()
    }
}

/// Tokens handed to a client after signup, login or refresh.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub user: User,
}

/// Issue a fresh access/refresh token pair for `user`.
pub fn issue_tokens(state: &AppState, conn: &Connection, user: User) -> AppResult<TokenPair> {
    let access_token = state
        .sessions
        .issue(user.id, state.config.access_token_ttl);

    let refresh_token = Uuid::new_v4().to_string();
    let expires_at = (Utc::now() + state.config.refresh_token_ttl).to_rfc3339();
    users::create_refresh_token(conn, user.id, &refresh_token, &expires_at)?;

    Ok(TokenPair {
        access_token,
        refresh_token,
        user,
    })
}

/// Extract the token from an `Authorization: Bearer` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Reject requests without a live bearer token; otherwise attach [`CurrentUser`].
pub async fn require_user(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let user_id = bearer_token(request.headers()).and_then(|token| state.sessions.resolve(token));

    match user_id {
        Some(id) => {
            request.extensions_mut().insert(CurrentUser { id });
            next.run(request).await
        }
        None => AppError::Unauthorized("Authentication required".into()).into_response(),
    }
}

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

/// Verify a password against an Argon2 hash.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed_hash) = PasswordHash::new(hash) else {
        tracing::error!("Invalid password hash format in users table");
        return false;
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}
