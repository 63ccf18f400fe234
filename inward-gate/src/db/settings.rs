//! Settings database access
//!
//! Read/write settings from the settings table (key-value store).
//! All settings are global/system-wide.

use inward_common::models::Settings;
use inward_common::Result;
use sqlx::SqlitePool;

const LOGO_KEY: &str = "logo";

/// Assemble the global settings record
pub async fn get_settings(db: &SqlitePool) -> Result<Settings> {
    Ok(Settings {
        logo: get_setting(db, LOGO_KEY).await?,
    })
}

/// Set or clear the logo reference
pub async fn set_logo(db: &SqlitePool, logo: Option<&str>) -> Result<()> {
    match logo {
        Some(value) => set_setting(db, LOGO_KEY, value).await,
        None => clear_setting(db, LOGO_KEY).await,
    }
}

async fn get_setting(db: &SqlitePool, key: &str) -> Result<Option<String>> {
    let value: Option<Option<String>> = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(db)
        .await?;
    Ok(value.flatten())
}

async fn set_setting(db: &SqlitePool, key: &str, value: &str) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO settings (key, value, updated_at) VALUES (?, ?, CURRENT_TIMESTAMP)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(key)
    .bind(value)
    .execute(db)
    .await?;
    Ok(())
}

async fn clear_setting(db: &SqlitePool, key: &str) -> Result<()> {
    sqlx::query("DELETE FROM settings WHERE key = ?")
        .bind(key)
        .execute(db)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::temp_db;

    #[tokio::test]
    async fn test_logo_set_and_clear() {
        let (_dir, db) = temp_db().await;
        assert_eq!(get_settings(&db).await.unwrap(), Settings::default());

        set_logo(&db, Some("data:image/png;base64,LOGO")).await.unwrap();
        set_logo(&db, Some("data:image/png;base64,LOGO2")).await.unwrap();
        assert_eq!(
            get_settings(&db).await.unwrap().logo.as_deref(),
            Some("data:image/png;base64,LOGO2")
        );

        set_logo(&db, None).await.unwrap();
        assert!(get_settings(&db).await.unwrap().logo.is_none());
    }
}
