use crate::models::transaction::{NewTransaction, Transaction};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, trace};

#[derive(Debug, Default)]
pub struct TransactionFilter {
    pub account_id: Option<i64>,
    pub category_id: Option<i64>,
    /// Inclusive `YYYY-MM-DD` bounds.
    pub from_date: Option<String>,
    pub to_date: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

const TRANSACTION_COLUMNS: &str = "t.id, t.user_id, t.account_id, t.category_id, t.amount,
     t.description, t.date, t.created_at, t.updated_at";

fn map_transaction(row: &Row<'_>) -> rusqlite::Result<Transaction> {
    Ok(Transaction {
        id: row.get(0)?,
        user_id: row.get(1)?,
        account_id: row.get(2)?,
        category_id: row.get(3)?,
        amount: row.get(4)?,
        description: row.get(5)?,
        date: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

pub fn list_transactions(
    conn: &Connection,
    user_id: i64,
    filter: &TransactionFilter,
) -> rusqlite::Result<Vec<Transaction>> {
    let mut sql = format!(
        "SELECT {} FROM transactions t WHERE t.user_id = ?",
        TRANSACTION_COLUMNS
    );
    let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(user_id)];

    if let Some(account_id) = filter.account_id {
        sql.push_str(" AND t.account_id = ?");
        params_vec.push(Box::new(account_id));
    }
    if let Some(category_id) = filter.category_id {
        sql.push_str(" AND t.category_id = ?");
        params_vec.push(Box::new(category_id));
    }
    if let Some(ref from_date) = filter.from_date {
        sql.push_str(" AND t.date >= ?");
        params_vec.push(Box::new(from_date.clone()));
    }
    if let Some(ref to_date) = filter.to_date {
        sql.push_str(" AND t.date <= ?");
        params_vec.push(Box::new(to_date.clone()));
    }

    sql.push_str(" ORDER BY t.date DESC, t.id DESC");

    if let Some(limit) = filter.limit {
        sql.push_str(" LIMIT ?");
        params_vec.push(Box::new(limit));
        if let Some(offset) = filter.offset {
            sql.push_str(" OFFSET ?");
            params_vec.push(Box::new(offset));
        }
    }

    let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
    let mut stmt = conn.prepare(&sql)?;
    let transactions = stmt
        .query_map(params_refs.as_slice(), map_transaction)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    debug!(user_id, count = transactions.len(), "Listed transactions");
    Ok(transactions)
}

/// Fetch a transaction by id regardless of owner. Ownership is checked by the caller.
pub fn get_transaction(conn: &Connection, id: i64) -> rusqlite::Result<Option<Transaction>> {
    trace!(transaction_id = id, "Fetching transaction");
    conn.query_row(
        &format!(
            "SELECT {} FROM transactions t WHERE t.id = ?",
            TRANSACTION_COLUMNS
        ),
        [id],
        map_transaction,
    )
    .optional()
}

pub fn create_transaction(
    conn: &Connection,
    user_id: i64,
    transaction: &NewTransaction,
) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO transactions (user_id, account_id, category_id, amount, description, date)
         VALUES (?, ?, ?, ?, ?, ?)",
        params![
            user_id,
            transaction.account_id,
            transaction.category_id,
            transaction.amount,
            transaction.description,
            transaction.date.format("%Y-%m-%d").to_string(),
        ],
    )?;

    let id = conn.last_insert_rowid();
    debug!(
        transaction_id = id,
        amount = transaction.amount,
        "Created transaction"
    );
    Ok(id)
}

pub fn update_transaction(
    conn: &Connection,
    id: i64,
    transaction: &NewTransaction,
) -> rusqlite::Result<bool> {
    let rows = conn.execute(
        "UPDATE transactions SET account_id = ?, category_id = ?, amount = ?,
         description = ?, date = ?, updated_at = datetime('now')
         WHERE id = ?",
        params![
            transaction.account_id,
            transaction.category_id,
            transaction.amount,
            transaction.description,
            transaction.date.format("%Y-%m-%d").to_string(),
            id,
        ],
    )?;
    if rows > 0 {
        debug!(transaction_id = id, "Updated transaction");
    }
    Ok(rows > 0)
}

pub fn delete_transaction(conn: &Connection, id: i64) -> rusqlite::Result<bool> {
    let rows = conn.execute("DELETE FROM transactions WHERE id = ?", [id])?;
    if rows > 0 {
        debug!(transaction_id = id, "Deleted transaction");
    }
    Ok(rows > 0)
}
