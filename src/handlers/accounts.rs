use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::Extension;
use rusqlite::TransactionBehavior;
use serde_json::{json, Value};

use crate::auth::CurrentUser;
use crate::db::queries::accounts;
use crate::error::{ApiJson, AppError, AppResult};
use crate::models::{Account, NewAccount};
use crate::services::{check_amount, ownership};
use crate::state::AppState;

fn validate(account: &NewAccount) -> AppResult<()> {
    if account.name.trim().is_empty() {
        return Err(AppError::Validation("Account name is required".into()));
    }
    check_amount("Balance", account.balance)?;
    Ok(())
}

pub async fn index(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> AppResult<Json<Vec<Account>>> {
    let conn = state.db.get()?;
    Ok(Json(accounts::list_accounts(&conn, user.id)?))
}

pub async fn show(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<Account>> {
    let conn = state.db.get()?;
    Ok(Json(ownership::owned_account(&conn, user.id, id)?))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    ApiJson(body): ApiJson<NewAccount>,
) -> AppResult<(StatusCode, Json<Account>)> {
    validate(&body)?;
    let conn = state.db.get()?;

    let id = accounts::create_account(&conn, user.id, &body)?;
    let account = accounts::get_account(&conn, id)?
        .ok_or_else(|| AppError::Internal("Account vanished after insert".into()))?;

    Ok((StatusCode::CREATED, Json(account)))
}

/// Direct edit, including the running balance.
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    ApiJson(body): ApiJson<NewAccount>,
) -> AppResult<Json<Account>> {
    validate(&body)?;
    let conn = state.db.get()?;

    ownership::owned_account(&conn, user.id, id)?;
    accounts::update_account(&conn, id, &body)?;

    let account = accounts::get_account(&conn, id)?
        .ok_or_else(|| AppError::NotFound(format!("Account {} not found", id)))?;
    Ok(Json(account))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<Value>> {
    let mut conn = state.db.get()?;
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    ownership::owned_account(&tx, user.id, id)?;
    let referenced = accounts::count_account_transactions(&tx, id)?;
    if referenced > 0 {
        return Err(AppError::Conflict(format!(
            "Account {} still has {} transaction(s)",
            id, referenced
        )));
    }

    accounts::delete_account(&tx, id)?;
    tx.commit()?;

    Ok(Json(json!({ "message": "Account deleted" })))
}
