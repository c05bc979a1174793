use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::Extension;
use rusqlite::TransactionBehavior;
use serde_json::{json, Value};
use tracing::info;

use crate::auth::CurrentUser;
use crate::db::queries::categories;
use crate::error::{ApiJson, AppError, AppResult};
use crate::models::{Category, NewCategory};
use crate::services::ownership;
use crate::state::AppState;

fn validate(category: &NewCategory) -> AppResult<()> {
    if category.name.trim().is_empty() {
        return Err(AppError::Validation("Category name is required".into()));
    }
    if category.group.trim().is_empty() {
        return Err(AppError::Validation("Category group is required".into()));
    }
    Ok(())
}

pub async fn index(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> AppResult<Json<Vec<Category>>> {
    let conn = state.db.get()?;
    Ok(Json(categories::list_categories(&conn, user.id)?))
}

pub async fn show(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<Category>> {
    let conn = state.db.get()?;
    Ok(Json(ownership::owned_category(&conn, user.id, id)?))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    ApiJson(body): ApiJson<NewCategory>,
) -> AppResult<(StatusCode, Json<Category>)> {
    validate(&body)?;
    let conn = state.db.get()?;

    let id = categories::create_category(&conn, user.id, &body)?;
    let category = categories::get_category(&conn, id)?
        .ok_or_else(|| AppError::Internal("Category vanished after insert".into()))?;

    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    ApiJson(body): ApiJson<NewCategory>,
) -> AppResult<Json<Category>> {
    validate(&body)?;
    let conn = state.db.get()?;

    ownership::owned_category(&conn, user.id, id)?;
    categories::update_category(&conn, id, &body)?;

    let category = categories::get_category(&conn, id)?
        .ok_or_else(|| AppError::NotFound(format!("Category {} not found", id)))?;
    Ok(Json(category))
}

/// Delete a category that nothing references any more.
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<Value>> {
    let mut conn = state.db.get()?;
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    ownership::owned_category(&tx, user.id, id)?;
    let (transactions, budget_items) = categories::count_category_references(&tx, id)?;
    if transactions > 0 || budget_items > 0 {
        return Err(AppError::Conflict(format!(
            "Category {} is referenced by {} transaction(s) and {} budget item(s)",
            id, transactions, budget_items
        )));
    }

    categories::delete_category(&tx, id)?;
    tx.commit()?;

    info!(user_id = user.id, category_id = id, "Deleted category");
    Ok(Json(json!({ "message": "Category deleted" })))
}
