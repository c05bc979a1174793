//! Transaction posting.
//!
//! Creating, editing or deleting a transaction touches up to three rows: the
//! transaction itself, its account's running balance and, when categorized, the
//! budget item for the month the transaction is dated in. Each operation runs
//! in one immediate SQLite transaction so the three stay in step.

use rusqlite::{Connection, TransactionBehavior};
use tracing::info;

use crate::config::SpentConvention;
use crate::db::queries::{accounts, transactions};
use crate::error::{AppError, AppResult};
use crate::models::{NewTransaction, Transaction};
use crate::services::{budget, check_amount, ownership};

/// Create a transaction, move its account balance and record its spend.
pub fn post_transaction(
    conn: &mut Connection,
    user_id: i64,
    new_transaction: &NewTransaction,
    convention: SpentConvention,
) -> AppResult<i64> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    check_references(&tx, user_id, new_transaction)?;
    let id = transactions::create_transaction(&tx, user_id, new_transaction)?;
    apply_effects(&tx, user_id, new_transaction, convention)?;

    tx.commit()?;

    info!(
        user_id,
        transaction_id = id,
        account_id = new_transaction.account_id,
        category_id = ?new_transaction.category_id,
        amount = new_transaction.amount,
        date = %new_transaction.date,
        "Posted transaction"
    );
    Ok(id)
}

/// Replace a transaction's fields, reversing the effects of its old values
/// before applying the new ones.
pub fn update_transaction(
    conn: &mut Connection,
    user_id: i64,
    id: i64,
    new_transaction: &NewTransaction,
    convention: SpentConvention,
) -> AppResult<Transaction> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let existing = ownership::owned_transaction(&tx, user_id, id)?;
    check_references(&tx, user_id, new_transaction)?;

    reverse_effects(&tx, user_id, &existing, convention)?;
    transactions::update_transaction(&tx, id, new_transaction)?;
    apply_effects(&tx, user_id, new_transaction, convention)?;

    let updated = transactions::get_transaction(&tx, id)?
        .ok_or_else(|| AppError::NotFound(format!("Transaction {} not found", id)))?;

    tx.commit()?;

    info!(
        user_id,
        transaction_id = id,
        old_amount = existing.amount,
        amount = new_transaction.amount,
        "Updated transaction"
    );
    Ok(updated)
}

/// Delete a transaction and undo its balance and budget effects.
pub fn delete_transaction(
    conn: &mut Connection,
    user_id: i64,
    id: i64,
    convention: SpentConvention,
) -> AppResult<()> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let existing = ownership::owned_transaction(&tx, user_id, id)?;
    reverse_effects(&tx, user_id, &existing, convention)?;
    transactions::delete_transaction(&tx, id)?;

    tx.commit()?;

    info!(user_id, transaction_id = id, "Deleted transaction");
    Ok(())
}

fn check_references(
    conn: &Connection,
    user_id: i64,
    new_transaction: &NewTransaction,
) -> AppResult<()> {
    check_amount("Transaction amount", new_transaction.amount)?;
    ownership::owned_account(conn, user_id, new_transaction.account_id)?;
    if let Some(category_id) = new_transaction.category_id {
        ownership::owned_category(conn, user_id, category_id)?;
    }
    Ok(())
}

fn apply_effects(
    conn: &Connection,
    user_id: i64,
    new_transaction: &NewTransaction,
    convention: SpentConvention,
) -> AppResult<()> {
    accounts::adjust_balance(conn, new_transaction.account_id, new_transaction.amount)?;
    if let Some(category_id) = new_transaction.category_id {
        budget::record_spend(
            conn,
            user_id,
            category_id,
            new_transaction.date,
            contribution(convention, new_transaction.amount)?,
        )?;
    }
    Ok(())
}

fn reverse_effects(
    conn: &Connection,
    user_id: i64,
    existing: &Transaction,
    convention: SpentConvention,
) -> AppResult<()> {
    accounts::adjust_balance(conn, existing.account_id, negate(existing.amount)?)?;
    if let Some(category_id) = existing.category_id {
        let date = existing.parsed_date().ok_or_else(|| {
            AppError::Internal(format!(
                "Transaction {} has unparseable date '{}'",
                existing.id, existing.date
            ))
        })?;
        budget::record_spend(
            conn,
            user_id,
            category_id,
            date,
            negate(contribution(convention, existing.amount)?)?,
        )?;
    }
    Ok(())
}

fn contribution(convention: SpentConvention, amount: i64) -> AppResult<i64> {
    convention
        .contribution(amount)
        .ok_or_else(|| AppError::Validation(format!("Amount {} is out of range", amount)))
}

fn negate(amount: i64) -> AppResult<i64> {
    amount
        .checked_neg()
        .ok_or_else(|| AppError::Validation(format!("Amount {} is out of range", amount)))
}
