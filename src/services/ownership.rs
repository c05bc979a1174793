//! Per-user ownership checks.
//!
//! A missing row is reported as [`AppError::NotFound`]; a row that exists but
//! belongs to somebody else is [`AppError::Forbidden`]. Checks always hit the
//! store and run before any mutation.

use rusqlite::Connection;
use tracing::warn;

use crate::db::queries::{accounts, categories, transactions};
use crate::error::{AppError, AppResult};
use crate::models::{Account, Category, Transaction};

fn check_owner(kind: &str, id: i64, owner_id: i64, user_id: i64) -> AppResult<()> {
    if owner_id == user_id {
        return Ok(());
    }
    warn!(user_id, owner_id, id, kind, "Rejected access to another user's resource");
    Err(AppError::Forbidden(format!(
        "{} {} does not belong to the current user",
        kind, id
    )))
}

pub fn owned_account(conn: &Connection, user_id: i64, account_id: i64) -> AppResult<Account> {
    let account = accounts::get_account(conn, account_id)?
        .ok_or_else(|| AppError::NotFound(format!("Account {} not found", account_id)))?;
    check_owner("Account", account_id, account.user_id, user_id)?;
    Ok(account)
}

pub fn owned_category(conn: &Connection, user_id: i64, category_id: i64) -> AppResult<Category> {
    let category = categories::get_category(conn, category_id)?
        .ok_or_else(|| AppError::NotFound(format!("Category {} not found", category_id)))?;
    check_owner("Category", category_id, category.user_id, user_id)?;
    Ok(category)
}

pub fn owned_transaction(
    conn: &Connection,
    user_id: i64,
    transaction_id: i64,
) -> AppResult<Transaction> {
    let transaction = transactions::get_transaction(conn, transaction_id)?.ok_or_else(|| {
        AppError::NotFound(format!("Transaction {} not found", transaction_id))
    })?;
    check_owner("Transaction", transaction_id, transaction.user_id, user_id)?;
    Ok(transaction)
}
