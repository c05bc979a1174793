use crate::models::user::{NewUser, RefreshToken, User};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, info};

fn map_user(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        password_hash: row.get(2)?,
        name: row.get(3)?,
        created_at: row.get(4)?,
    })
}

pub fn get_user(conn: &Connection, id: i64) -> rusqlite::Result<Option<User>> {
    conn.query_row(
        "SELECT id, email, password_hash, name, created_at FROM users WHERE id = ?",
        [id],
        map_user,
    )
    .optional()
}

pub fn find_user_by_email(conn: &Connection, email: &str) -> rusqlite::Result<Option<User>> {
    conn.query_row(
        "SELECT id, email, password_hash, name, created_at FROM users WHERE email = ?",
        [email],
        map_user,
    )
    .optional()
}

pub fn create_user(conn: &Connection, user: &NewUser) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO users (email, password_hash, name) VALUES (?, ?, ?)",
        params![user.email, user.password_hash, user.name],
    )?;
    let id = conn.last_insert_rowid();
    info!(user_id = id, "Created user");
    Ok(id)
}

pub fn create_refresh_token(
    conn: &Connection,
    user_id: i64,
    token: &str,
    expires_at: &str,
) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO refresh_tokens (token, user_id, expires_at) VALUES (?, ?, ?)",
        params![token, user_id, expires_at],
    )?;
    let id = conn.last_insert_rowid();
    debug!(user_id, "Issued refresh token");
    Ok(id)
}

pub fn find_refresh_token(conn: &Connection, token: &str) -> rusqlite::Result<Option<RefreshToken>> {
    conn.query_row(
        "SELECT id, token, user_id, expires_at FROM refresh_tokens WHERE token = ?",
        [token],
        |row| {
            Ok(RefreshToken {
                id: row.get(0)?,
                token: row.get(1)?,
                user_id: row.get(2)?,
                expires_at: row.get(3)?,
            })
        },
    )
    .optional()
}

pub fn delete_refresh_token(conn: &Connection, token: &str) -> rusqlite::Result<bool> {
    let rows = conn.execute("DELETE FROM refresh_tokens WHERE token = ?", [token])?;
    Ok(rows > 0)
}

pub fn delete_expired_refresh_tokens(conn: &Connection, now: &str) -> rusqlite::Result<usize> {
    let rows = conn.execute("DELETE FROM refresh_tokens WHERE expires_at <= ?", [now])?;
    if rows > 0 {
        debug!(count = rows, "Pruned expired refresh tokens");
    }
    Ok(rows)
}
