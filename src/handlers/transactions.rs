use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::Extension;
use chrono::{DateTime, Datelike, Local, NaiveDate};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::auth::CurrentUser;
use crate::db::queries::transactions::{self, TransactionFilter};
use crate::error::{ApiJson, AppError, AppResult};
use crate::models::{NewTransaction, Transaction};
use crate::month::YearMonth;
use crate::services::{ownership, posting};
use crate::state::AppState;

/// Request body for creating or replacing a transaction. Amounts are integer
/// minor units; a fractional amount is rejected by deserialization.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPayload {
    pub amount: i64,
    pub account_id: i64,
    #[serde(default)]
    pub description: String,
    pub category_id: Option<i64>,
    pub date: Option<String>,
}

impl TransactionPayload {
    pub fn to_new_transaction(&self) -> AppResult<NewTransaction> {
        let date = match self.date.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => parse_transaction_date(s)?,
            _ => Local::now().date_naive(),
        };

        Ok(NewTransaction {
            account_id: self.account_id,
            category_id: self.category_id,
            amount: self.amount,
            description: self.description.trim().to_string(),
            date,
        })
    }
}

/// Accept a plain `YYYY-MM-DD` date or an RFC 3339 timestamp. A timestamp keeps
/// the calendar date of its own offset. The year must fit a budget month.
pub fn parse_transaction_date(s: &str) -> AppResult<NaiveDate> {
    let invalid = || AppError::Validation(format!("Invalid date '{}'", s));

    let date = match NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        Ok(date) => date,
        Err(_) => DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.date_naive())
            .map_err(|_| invalid())?,
    };

    YearMonth::new(date.year(), date.month()).ok_or_else(invalid)?;
    Ok(date)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub month: Option<String>,
    pub account_id: Option<i64>,
    pub category_id: Option<i64>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

pub async fn index(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(params): Query<ListParams>,
) -> AppResult<Json<Vec<Transaction>>> {
    let (from_date, to_date) = match params.month.as_deref() {
        Some(month) => {
            let month: YearMonth = month.parse()?;
            (
                Some(month.first_day().format("%Y-%m-%d").to_string()),
                Some(month.last_day().format("%Y-%m-%d").to_string()),
            )
        }
        None => (None, None),
    };

    let filter = TransactionFilter {
        account_id: params.account_id,
        category_id: params.category_id,
        from_date,
        to_date,
        limit: params.limit,
        offset: params.offset,
    };

    let conn = state.db.get()?;
    Ok(Json(transactions::list_transactions(&conn, user.id, &filter)?))
}

pub async fn show(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<Transaction>> {
    let conn = state.db.get()?;
    Ok(Json(ownership::owned_transaction(&conn, user.id, id)?))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    ApiJson(body): ApiJson<TransactionPayload>,
) -> AppResult<(StatusCode, Json<Value>)> {
    debug!(user_id = user.id, amount = body.amount, "Creating transaction");
    let new_transaction = body.to_new_transaction()?;

    let mut conn = state.db.get()?;
    let id = posting::post_transaction(
        &mut conn,
        user.id,
        &new_transaction,
        state.spent_convention(),
    )?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Transaction created", "transactionId": id })),
    ))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    ApiJson(body): ApiJson<TransactionPayload>,
) -> AppResult<Json<Transaction>> {
    debug!(user_id = user.id, transaction_id = id, "Updating transaction");
    let new_transaction = body.to_new_transaction()?;

    let mut conn = state.db.get()?;
    let updated = posting::update_transaction(
        &mut conn,
        user.id,
        id,
        &new_transaction,
        state.spent_convention(),
    )?;

    Ok(Json(updated))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<Value>> {
    let mut conn = state.db.get()?;
    posting::delete_transaction(&mut conn, user.id, id, state.spent_convention())?;
    Ok(Json(json!({ "message": "Transaction deleted" })))
}
