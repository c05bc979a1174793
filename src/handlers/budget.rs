use axum::extract::{Path, State};
use axum::response::Json;
use axum::Extension;
use serde::{Deserialize, Serialize};

use crate::auth::CurrentUser;
use crate::error::{ApiJson, AppResult};
use crate::models::{BudgetItem, BudgetItemWithCategory, RolloverSummary};
use crate::month::YearMonth;
use crate::services::budget;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AssignRequest {
    pub amount: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RolloverResponse {
    pub message: String,
    #[serde(flatten)]
    pub summary: RolloverSummary,
}

pub async fn show(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(month): Path<String>,
) -> AppResult<Json<Vec<BudgetItemWithCategory>>> {
    let month: YearMonth = month.parse()?;
    let conn = state.db.get()?;
    Ok(Json(budget::read(&conn, user.id, month)?))
}

pub async fn assign(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path((month, category_id)): Path<(String, i64)>,
    ApiJson(body): ApiJson<AssignRequest>,
) -> AppResult<Json<BudgetItem>> {
    let month: YearMonth = month.parse()?;
    let mut conn = state.db.get()?;
    let item = budget::assign(&mut conn, user.id, month, category_id, body.amount)?;
    Ok(Json(item))
}

pub async fn rollover(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(month): Path<String>,
) -> AppResult<Json<RolloverResponse>> {
    let month: YearMonth = month.parse()?;
    let mut conn = state.db.get()?;
    let summary = budget::rollover(&mut conn, user.id, month)?;

    Ok(Json(RolloverResponse {
        message: format!("Rolled over {} into {}", summary.from, summary.to),
        summary,
    }))
}
