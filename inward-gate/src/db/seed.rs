//! Guarded default-data inserts
//!
//! Each seeding group is claimed by inserting its marker row inside the same
//! transaction as the defaults. A second claimant (concurrent or later) finds
//! the marker and inserts nothing.

use inward_common::models::{Role, User};
use inward_common::Result;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

const MASTER_DATA_MARKER: &str = "master_data";
const USERS_MARKER: &str = "users";

/// Seed clients and products if the marker is unclaimed and no client exists
///
/// Returns true when defaults were inserted.
pub async fn seed_master_data(db: &SqlitePool, clients: &[&str], products: &[&str]) -> Result<bool> {
    let mut tx = db.begin().await?;

    let claimed = sqlx::query("INSERT OR IGNORE INTO seed_markers (name) VALUES (?)")
        .bind(MASTER_DATA_MARKER)
        .execute(&mut *tx)
        .await?
        .rows_affected()
        == 1;
    if !claimed {
        debug!("Master data seeding already claimed");
        return Ok(false);
    }

    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM clients")
        .fetch_one(&mut *tx)
        .await?;
    if existing > 0 {
        // Keep the claim: data exists, so defaults are never wanted again
        tx.commit().await?;
        return Ok(false);
    }

    for name in clients {
        sqlx::query("INSERT INTO clients (guid, name) VALUES (?, ?)")
            .bind(Uuid::new_v4().to_string())
            .bind(*name)
            .execute(&mut *tx)
            .await?;
    }
    for name in products {
        sqlx::query("INSERT INTO products (guid, name) VALUES (?, ?)")
            .bind(Uuid::new_v4().to_string())
            .bind(*name)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(true)
}

/// Seed default users if the marker is unclaimed and no user exists
pub async fn seed_users(db: &SqlitePool, users: &[(&str, &str, Role, &str)]) -> Result<bool> {
    let mut tx = db.begin().await?;

    let claimed = sqlx::query("INSERT OR IGNORE INTO seed_markers (name) VALUES (?)")
        .bind(USERS_MARKER)
        .execute(&mut *tx)
        .await?
        .rows_affected()
        == 1;
    if !claimed {
        debug!("User seeding already claimed");
        return Ok(false);
    }

    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(&mut *tx)
        .await?;
    if existing > 0 {
        tx.commit().await?;
        return Ok(false);
    }

    for (username, password, role, name) in users {
        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            password: password.to_string(),
            role: *role,
            name: name.to_string(),
        };
        sqlx::query("INSERT INTO users (guid, username, password, role, name) VALUES (?, ?, ?, ?, ?)")
            .bind(user.id.to_string())
            .bind(&user.username)
            .bind(&user.password)
            .bind(user.role.as_str())
            .bind(&user.name)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(true)
}
