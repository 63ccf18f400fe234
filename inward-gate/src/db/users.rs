//! User table queries

use inward_common::models::{Role, User};
use inward_common::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

pub async fn list_users(db: &SqlitePool) -> Result<Vec<User>> {
    let rows = sqlx::query("SELECT guid, username, password, role, name FROM users ORDER BY created_at ASC, username ASC")
        .fetch_all(db)
        .await?;

    rows.iter().map(user_from_row).collect()
}

pub async fn find_by_username(db: &SqlitePool, username: &str) -> Result<Option<User>> {
    let row = sqlx::query("SELECT guid, username, password, role, name FROM users WHERE username = ?")
        .bind(username)
        .fetch_optional(db)
        .await?;

    row.as_ref().map(user_from_row).transpose()
}

pub async fn get_user(db: &SqlitePool, id: Uuid) -> Result<Option<User>> {
    let row = sqlx::query("SELECT guid, username, password, role, name FROM users WHERE guid = ?")
        .bind(id.to_string())
        .fetch_optional(db)
        .await?;

    row.as_ref().map(user_from_row).transpose()
}

/// Insert a user; a duplicate username is a validation error
pub async fn insert_user(db: &SqlitePool, user: &User) -> Result<()> {
    let result = sqlx::query("INSERT INTO users (guid, username, password, role, name) VALUES (?, ?, ?, ?, ?)")
        .bind(user.id.to_string())
        .bind(&user.username)
        .bind(&user.password)
        .bind(user.role.as_str())
        .bind(&user.name)
        .execute(db)
        .await;

    match result {
        Ok(_) => Ok(()),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(Error::Validation(
            format!("Username '{}' already exists", user.username),
        )),
        Err(e) => Err(e.into()),
    }
}

pub async fn delete_user(db: &SqlitePool, id: Uuid) -> Result<()> {
    let result = sqlx::query("DELETE FROM users WHERE guid = ?")
        .bind(id.to_string())
        .execute(db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("User {}", id)));
    }
    Ok(())
}

fn user_from_row(row: &SqliteRow) -> Result<User> {
    let guid: String = row.try_get("guid")?;
    let role: String = row.try_get("role")?;

    Ok(User {
        id: super::parse_guid(&guid)?,
        username: row.try_get("username")?,
        password: row.try_get("password")?,
        role: role.parse::<Role>()?,
        name: row.try_get("name")?,
    })
}
