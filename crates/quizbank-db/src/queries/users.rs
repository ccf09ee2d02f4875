use crate::Database;
use crate::models::UserRow;
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension};

impl Database {
    pub fn create_user(&self, id: &str, name: &str, email: &str, password_hash: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, name, email, password) VALUES (?1, ?2, ?3, ?4)",
                (id, name, email, password_hash),
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "email", email))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    /// Returns false when the user does not exist.
    pub fn set_user_admin(&self, id: &str, is_admin: bool) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE users SET is_admin = ?1 WHERE id = ?2",
                (is_admin, id),
            )?;
            Ok(changed > 0)
        })
    }
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    // column is one of our own identifiers, never user input
    let sql = format!("SELECT id, name, email, password, is_admin FROM users WHERE {} = ?1", column);
    let mut stmt = conn.prepare(&sql)?;

    let row = stmt
        .query_row([value], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                name: row.get(1)?,
                email: row.get(2)?,
                password: row.get(3)?,
                is_admin: row.get(4)?,
            })
        })
        .optional()?;

    Ok(row)
}
