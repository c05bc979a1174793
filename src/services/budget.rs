//! Monthly envelope budget engine.
//!
//! Tracks, per user, month and category, how much was assigned (`amount`), how
//! much transactions contributed (`spent`), how much was carried in from the
//! previous month (`carryover`) and what remains (`available`). Budget months
//! and items are created lazily; an absent item reads as all zeros.

use chrono::NaiveDate;
use rusqlite::{Connection, TransactionBehavior};
use tracing::{debug, info, warn};

use crate::db::queries::budget as queries;
use crate::error::{AppError, AppResult};
use crate::models::{
    BudgetFigures, BudgetItem, BudgetItemWithCategory, BudgetMonth, CarriedAmount,
    RolloverSummary,
};
use crate::month::YearMonth;
use crate::services::{check_amount, ownership};

/// The budget month governing a `(user, month, category)` triple and the
/// category's item in it, if one has been written.
#[derive(Debug, Clone)]
pub struct ResolvedItem {
    pub budget_month: BudgetMonth,
    pub item: Option<BudgetItem>,
}

impl ResolvedItem {
    /// Current figures, treating a missing item as zero.
    pub fn figures(&self) -> BudgetFigures {
        self.item
            .as_ref()
            .map(BudgetItem::figures)
            .unwrap_or_default()
    }
}

/// Look up the budget month for `(user_id, month)`, creating it if needed, and
/// the category's item within it. Absence of the item is not an error.
pub fn resolve_item(
    conn: &Connection,
    user_id: i64,
    month: YearMonth,
    category_id: i64,
) -> AppResult<ResolvedItem> {
    let budget_month = queries::get_or_create_month(conn, user_id, &month.to_string())?;
    let item = queries::find_item(conn, budget_month.id, category_id)?;
    Ok(ResolvedItem { budget_month, item })
}

/// Set the assigned amount for a category in a month.
///
/// `spent` and `carryover` are left as stored and `available` is recomputed from
/// them. Assigning the same amount twice leaves the same state.
pub fn assign(
    conn: &mut Connection,
    user_id: i64,
    month: YearMonth,
    category_id: i64,
    amount: i64,
) -> AppResult<BudgetItem> {
    check_amount("Budget amount", amount)?;
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    ownership::owned_category(&tx, user_id, category_id)?;
    let resolved = resolve_item(&tx, user_id, month, category_id)?;
    let item = queries::upsert_assignment(&tx, resolved.budget_month.id, category_id, amount)?;

    tx.commit()?;

    info!(
        user_id,
        month = %month,
        category_id,
        previous = resolved.figures().amount,
        amount,
        available = item.available,
        "Assigned budget amount"
    );
    Ok(item)
}

/// Add a transaction's contribution to the `spent` of its category in the month
/// the transaction is dated in.
///
/// Runs on the caller's connection so it joins the caller's transaction.
pub fn record_spend(
    conn: &Connection,
    user_id: i64,
    category_id: i64,
    date: NaiveDate,
    contribution: i64,
) -> AppResult<BudgetItem> {
    let month = YearMonth::from_date(date);
    let resolved = resolve_item(conn, user_id, month, category_id)?;
    let item = queries::add_spent(conn, resolved.budget_month.id, category_id, contribution)?;

    debug!(
        user_id,
        month = %month,
        category_id,
        contribution,
        spent = item.spent,
        available = item.available,
        "Recorded spend against budget"
    );
    Ok(item)
}

/// Carry every positive `available` of `month` into the following month.
///
/// Non-positive balances are skipped, so deficits are not carried. The source
/// month is left untouched apart from its rolled-over marker. Running this twice
/// for the same month carries the amounts twice; a repeat is logged and
/// flagged in the summary but still applied.
pub fn rollover(
    conn: &mut Connection,
    user_id: i64,
    month: YearMonth,
) -> AppResult<RolloverSummary> {
    let next = month.next().ok_or_else(|| {
        AppError::Validation(format!("Budget month {} has no following month", month))
    })?;
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let source = queries::find_month(&tx, user_id, &month.to_string())?
        .ok_or_else(|| AppError::NotFound(format!("Budget month {} not found", month)))?;

    let repeated = source.rolled_over_at.is_some();
    if repeated {
        warn!(
            user_id,
            month = %month,
            rolled_over_at = source.rolled_over_at.as_deref().unwrap_or_default(),
            "Rolling over a month that was already rolled over"
        );
    }

    let destination = queries::get_or_create_month(&tx, user_id, &next.to_string())?;

    let mut carried = Vec::new();
    for item in queries::list_items(&tx, source.id)? {
        if item.available <= 0 {
            continue;
        }
        queries::add_carryover(&tx, destination.id, item.category_id, item.available)?;
        carried.push(CarriedAmount {
            category_id: item.category_id,
            amount: item.available,
        });
    }

    queries::mark_rolled_over(&tx, source.id)?;
    tx.commit()?;

    let total = carried.iter().map(|c| c.amount).sum();
    info!(
        user_id,
        from = %month,
        to = %next,
        categories = carried.len(),
        total,
        "Rolled over budget month"
    );

    Ok(RolloverSummary {
        from: month.to_string(),
        to: next.to_string(),
        carried,
        total,
        repeated,
    })
}

/// Every item of a user's month with its category. Categories without an item
/// are omitted. Reading never creates a budget month.
pub fn read(
    conn: &Connection,
    user_id: i64,
    month: YearMonth,
) -> AppResult<Vec<BudgetItemWithCategory>> {
    let items = queries::list_items_with_category(conn, user_id, &month.to_string())?;
    debug!(user_id, month = %month, count = items.len(), "Read budget month");
    Ok(items)
}
