use crate::models::category::{Category, NewCategory};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::debug;

fn map_category(row: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        group: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

pub fn list_categories(conn: &Connection, user_id: i64) -> rusqlite::Result<Vec<Category>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, name, group_name, created_at, updated_at
         FROM categories
         WHERE user_id = ?
         ORDER BY group_name, name",
    )?;

    let categories = stmt
        .query_map([user_id], map_category)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(categories)
}

/// Fetch a category by id regardless of owner. Ownership is checked by the caller.
pub fn get_category(conn: &Connection, id: i64) -> rusqlite::Result<Option<Category>> {
    conn.query_row(
        "SELECT id, user_id, name, group_name, created_at, updated_at
         FROM categories WHERE id = ?",
        [id],
        map_category,
    )
    .optional()
}

pub fn create_category(
    conn: &Connection,
    user_id: i64,
    category: &NewCategory,
) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO categories (user_id, name, group_name) VALUES (?, ?, ?)",
        params![user_id, category.name, category.group],
    )?;
    let id = conn.last_insert_rowid();
    debug!(category_id = id, user_id, name = %category.name, "Created category");
    Ok(id)
}

pub fn update_category(
    conn: &Connection,
    id: i64,
    category: &NewCategory,
) -> rusqlite::Result<bool> {
    let rows = conn.execute(
        "UPDATE categories SET name = ?, group_name = ?, updated_at = datetime('now')
         WHERE id = ?",
        params![category.name, category.group, id],
    )?;
    if rows > 0 {
        debug!(category_id = id, name = %category.name, "Updated category");
    }
    Ok(rows > 0)
}

/// Number of transactions and budget items that still point at the category.
pub fn count_category_references(conn: &Connection, id: i64) -> rusqlite::Result<(i64, i64)> {
    conn.query_row(
        "SELECT (SELECT COUNT(*) FROM transactions WHERE category_id = ?1),
                (SELECT COUNT(*) FROM budget_items WHERE category_id = ?1)",
        [id],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )
}

pub fn delete_category(conn: &Connection, id: i64) -> rusqlite::Result<bool> {
    let rows = conn.execute("DELETE FROM categories WHERE id = ?", [id])?;
    if rows > 0 {
        debug!(category_id = id, "Deleted category");
    }
    Ok(rows > 0)
}
