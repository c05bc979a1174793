use crate::models::account::{Account, AccountType, NewAccount};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, info};

fn map_account(row: &Row<'_>) -> rusqlite::Result<Account> {
    let account_type_str: String = row.get(3)?;
    Ok(Account {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        account_type: AccountType::parse(&account_type_str).unwrap_or_default(),
        balance: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

pub fn list_accounts(conn: &Connection, user_id: i64) -> rusqlite::Result<Vec<Account>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, name, account_type, balance, created_at, updated_at
         FROM accounts
         WHERE user_id = ?
         ORDER BY name",
    )?;

    let accounts = stmt
        .query_map([user_id], map_account)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(accounts)
}

/// Fetch an account by id regardless of owner. Ownership is checked by the caller.
pub fn get_account(conn: &Connection, id: i64) -> rusqlite::Result<Option<Account>> {
    conn.query_row(
        "SELECT id, user_id, name, account_type, balance, created_at, updated_at
         FROM accounts WHERE id = ?",
        [id],
        map_account,
    )
    .optional()
}

pub fn create_account(
    conn: &Connection,
    user_id: i64,
    account: &NewAccount,
) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO accounts (user_id, name, account_type, balance) VALUES (?, ?, ?, ?)",
        params![
            user_id,
            account.name,
            account.account_type.as_str(),
            account.balance
        ],
    )?;
    let id = conn.last_insert_rowid();
    info!(account_id = id, user_id, name = %account.name, "Created account");
    Ok(id)
}

pub fn update_account(conn: &Connection, id: i64, account: &NewAccount) -> rusqlite::Result<bool> {
    let rows = conn.execute(
        "UPDATE accounts SET name = ?, account_type = ?, balance = ?, updated_at = datetime('now')
         WHERE id = ?",
        params![
            account.name,
            account.account_type.as_str(),
            account.balance,
            id
        ],
    )?;
    if rows > 0 {
        info!(account_id = id, name = %account.name, "Updated account");
    }
    Ok(rows > 0)
}

/// Add `delta` to the account balance in place.
pub fn adjust_balance(conn: &Connection, id: i64, delta: i64) -> rusqlite::Result<bool> {
    let rows = conn.execute(
        "UPDATE accounts SET balance = balance + ?, updated_at = datetime('now') WHERE id = ?",
        params![delta, id],
    )?;
    if rows > 0 {
        debug!(account_id = id, delta, "Adjusted account balance");
    }
    Ok(rows > 0)
}

pub fn count_account_transactions(conn: &Connection, id: i64) -> rusqlite::Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM transactions WHERE account_id = ?",
        [id],
        |row| row.get(0),
    )
}

pub fn delete_account(conn: &Connection, id: i64) -> rusqlite::Result<bool> {
    let rows = conn.execute("DELETE FROM accounts WHERE id = ?", [id])?;
    if rows > 0 {
        info!(account_id = id, "Deleted account");
    }
    Ok(rows > 0)
}
