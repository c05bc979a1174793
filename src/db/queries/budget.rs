//! SQL for `budget_months` and `budget_items`.
//!
//! Item writes are single upserts keyed on `(budget_month_id, category_id)`.
//! Arithmetic happens inside the statement against the stored row, so two
//! writers racing on the same item serialize in SQLite rather than overwrite
//! each other's increments. Every write recomputes
//! `available = amount + carryover - spent`.

use crate::models::budget::{BudgetItem, BudgetItemWithCategory, BudgetMonth};
use crate::models::category::Category;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, trace};

const ITEM_COLUMNS: &str =
    "id, budget_month_id, category_id, amount, spent, carryover, available, updated_at";

fn map_month(row: &Row<'_>) -> rusqlite::Result<BudgetMonth> {
    Ok(BudgetMonth {
        id: row.get(0)?,
        user_id: row.get(1)?,
        month: row.get(2)?,
        rolled_over_at: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn map_item(row: &Row<'_>) -> rusqlite::Result<BudgetItem> {
    Ok(BudgetItem {
        id: row.get(0)?,
        budget_month_id: row.get(1)?,
        category_id: row.get(2)?,
        amount: row.get(3)?,
        spent: row.get(4)?,
        carryover: row.get(5)?,
        available: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

pub fn find_month(
    conn: &Connection,
    user_id: i64,
    month: &str,
) -> rusqlite::Result<Option<BudgetMonth>> {
    conn.query_row(
        "SELECT id, user_id, month, rolled_over_at, created_at
         FROM budget_months WHERE user_id = ? AND month = ?",
        params![user_id, month],
        map_month,
    )
    .optional()
}

/// Return the budget month for `(user_id, month)`, inserting an empty one first
/// if none exists.
pub fn get_or_create_month(
    conn: &Connection,
    user_id: i64,
    month: &str,
) -> rusqlite::Result<BudgetMonth> {
    let inserted = conn.execute(
        "INSERT INTO budget_months (user_id, month) VALUES (?, ?)
         ON CONFLICT(user_id, month) DO NOTHING",
        params![user_id, month],
    )?;
    if inserted > 0 {
        debug!(user_id, month, "Created budget month");
    }

    conn.query_row(
        "SELECT id, user_id, month, rolled_over_at, created_at
         FROM budget_months WHERE user_id = ? AND month = ?",
        params![user_id, month],
        map_month,
    )
}

pub fn mark_rolled_over(conn: &Connection, budget_month_id: i64) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE budget_months SET rolled_over_at = datetime('now') WHERE id = ?",
        [budget_month_id],
    )?;
    Ok(())
}

pub fn find_item(
    conn: &Connection,
    budget_month_id: i64,
    category_id: i64,
) -> rusqlite::Result<Option<BudgetItem>> {
    trace!(budget_month_id, category_id, "Fetching budget item");
    conn.query_row(
        &format!(
            "SELECT {} FROM budget_items WHERE budget_month_id = ? AND category_id = ?",
            ITEM_COLUMNS
        ),
        params![budget_month_id, category_id],
        map_item,
    )
    .optional()
}

pub fn list_items(conn: &Connection, budget_month_id: i64) -> rusqlite::Result<Vec<BudgetItem>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM budget_items WHERE budget_month_id = ? ORDER BY category_id",
        ITEM_COLUMNS
    ))?;

    let items = stmt
        .query_map([budget_month_id], map_item)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(items)
}

/// All items of a user's month joined with their category.
pub fn list_items_with_category(
    conn: &Connection,
    user_id: i64,
    month: &str,
) -> rusqlite::Result<Vec<BudgetItemWithCategory>> {
    let mut stmt = conn.prepare(
        "SELECT bi.id, bi.budget_month_id, bi.category_id, bi.amount, bi.spent,
                bi.carryover, bi.available, bi.updated_at,
                c.id, c.user_id, c.name, c.group_name, c.created_at, c.updated_at
         FROM budget_items bi
         JOIN budget_months bm ON bi.budget_month_id = bm.id
         JOIN categories c ON bi.category_id = c.id
         WHERE bm.user_id = ? AND bm.month = ?
         ORDER BY c.group_name, c.name",
    )?;

    let items = stmt
        .query_map(params![user_id, month], |row| {
            Ok(BudgetItemWithCategory {
                item: map_item(row)?,
                category: Category {
                    id: row.get(8)?,
                    user_id: row.get(9)?,
                    name: row.get(10)?,
                    group: row.get(11)?,
                    created_at: row.get(12)?,
                    updated_at: row.get(13)?,
                },
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(items)
}

/// Set the assigned amount, keeping `spent` and `carryover` as stored.
pub fn upsert_assignment(
    conn: &Connection,
    budget_month_id: i64,
    category_id: i64,
    amount: i64,
) -> rusqlite::Result<BudgetItem> {
    conn.query_row(
        &format!(
            "INSERT INTO budget_items
                 (budget_month_id, category_id, amount, spent, carryover, available)
             VALUES (?1, ?2, ?3, 0, 0, ?3)
             ON CONFLICT(budget_month_id, category_id) DO UPDATE SET
                 amount = excluded.amount,
                 available = excluded.amount + budget_items.carryover - budget_items.spent,
                 updated_at = datetime('now')
             RETURNING {}",
            ITEM_COLUMNS
        ),
        params![budget_month_id, category_id, amount],
        map_item,
    )
}

/// Add `delta` to `spent`. A missing item is created with `amount = 0`.
pub fn add_spent(
    conn: &Connection,
    budget_month_id: i64,
    category_id: i64,
    delta: i64,
) -> rusqlite::Result<BudgetItem> {
    conn.query_row(
        &format!(
            "INSERT INTO budget_items
                 (budget_month_id, category_id, amount, spent, carryover, available)
             VALUES (?1, ?2, 0, ?3, 0, -?3)
             ON CONFLICT(budget_month_id, category_id) DO UPDATE SET
                 spent = budget_items.spent + excluded.spent,
                 available = budget_items.amount + budget_items.carryover
                     - (budget_items.spent + excluded.spent),
                 updated_at = datetime('now')
             RETURNING {}",
            ITEM_COLUMNS
        ),
        params![budget_month_id, category_id, delta],
        map_item,
    )
}

/// Add `delta` to `carryover` (and therefore to `available`). A missing item is
/// created with `amount = 0, spent = 0`.
pub fn add_carryover(
    conn: &Connection,
    budget_month_id: i64,
    category_id: i64,
    delta: i64,
) -> rusqlite::Result<BudgetItem> {
    conn.query_row(
        &format!(
            "INSERT INTO budget_items
                 (budget_month_id, category_id, amount, spent, carryover, available)
             VALUES (?1, ?2, 0, 0, ?3, ?3)
             ON CONFLICT(budget_month_id, category_id) DO UPDATE SET
                 carryover = budget_items.carryover + excluded.carryover,
                 available = budget_items.amount + budget_items.carryover
                     + excluded.carryover - budget_items.spent,
                 updated_at = datetime('now')
             RETURNING {}",
            ITEM_COLUMNS
        ),
        params![budget_month_id, category_id, delta],
        map_item,
    )
}
