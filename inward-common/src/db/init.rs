//! Database initialization
//!
//! Creates the database on first run and brings the schema up idempotently on
//! every start. Each application namespace lives in its own database file.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // WAL allows concurrent readers with one writer; busy timeout lets a second
    // writer wait instead of failing immediately (seeding relies on this).
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true)
        .busy_timeout(Duration::from_millis(5000));

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_schema(&pool).await?;

    Ok(pool)
}

/// Create all tables (idempotent - safe to call multiple times)
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_entries_table(pool).await?;
    create_master_table(pool, "clients").await?;
    create_master_table(pool, "products").await?;
    create_users_table(pool).await?;
    create_settings_table(pool).await?;
    create_seed_markers_table(pool).await?;
    Ok(())
}

async fn create_entries_table(pool: &SqlitePool) -> Result<()> {
    // created_at: microseconds since epoch; NULL sorts as the epoch
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS entries (
            guid TEXT PRIMARY KEY,
            vehicle_no TEXT NOT NULL CHECK (length(vehicle_no) > 0),
            client_name TEXT NOT NULL CHECK (length(client_name) > 0),
            product_name TEXT NOT NULL CHECK (length(product_name) > 0),
            lot_no TEXT,
            bags INTEGER CHECK (bags IS NULL OR bags >= 0),
            bag_weight REAL CHECK (bag_weight IS NULL OR bag_weight >= 0),
            total_weight REAL NOT NULL DEFAULT 0,
            transport_charges REAL CHECK (transport_charges IS NULL OR transport_charges >= 0),
            transport_mode TEXT NOT NULL DEFAULT 'Client Transport',
            remarks TEXT,
            qc_status TEXT NOT NULL DEFAULT 'Pending'
                CHECK (qc_status IN ('Pending', 'Approved', 'Rejected')),
            plate_image TEXT,
            signature TEXT,
            created_at INTEGER,
            created_by TEXT NOT NULL,
            date_string TEXT NOT NULL,
            entry_code TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_entries_created_at ON entries(created_at)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_master_table(pool: &SqlitePool, table: &str) -> Result<()> {
    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {} (
            guid TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
        table
    ))
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_users_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            guid TEXT PRIMARY KEY,
            username TEXT NOT NULL UNIQUE,
            password TEXT NOT NULL,
            role TEXT NOT NULL CHECK (role IN ('admin', 'staff')),
            name TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the settings table
///
/// Key-value pairs; the global settings record is assembled from these keys.
async fn create_settings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// One row per seeding group that has already been claimed
async fn create_seed_markers_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS seed_markers (
            name TEXT PRIMARY KEY,
            claimed_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
