//! Client and product table queries
//!
//! Both lists share one shape; `MasterKind` selects the table.

use inward_common::models::{MasterItem, MasterKind};
use inward_common::{Error, Result};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// All items of one kind, sorted by name
pub async fn list_items(db: &SqlitePool, kind: MasterKind) -> Result<Vec<MasterItem>> {
    let rows = sqlx::query(&format!(
        "SELECT guid, name FROM {} ORDER BY name COLLATE NOCASE ASC, guid ASC",
        kind.table()
    ))
    .fetch_all(db)
    .await?;

    rows.iter()
        .map(|row| {
            let guid: String = row.try_get("guid")?;
            Ok(MasterItem {
                id: super::parse_guid(&guid)?,
                name: row.try_get("name")?,
            })
        })
        .collect()
}

pub async fn insert_item(db: &SqlitePool, kind: MasterKind, name: &str) -> Result<MasterItem> {
    let item = MasterItem {
        id: Uuid::new_v4(),
        name: name.to_string(),
    };

    sqlx::query(&format!("INSERT INTO {} (guid, name) VALUES (?, ?)", kind.table()))
        .bind(item.id.to_string())
        .bind(&item.name)
        .execute(db)
        .await?;

    Ok(item)
}

pub async fn rename_item(db: &SqlitePool, kind: MasterKind, id: Uuid, name: &str) -> Result<()> {
    let result = sqlx::query(&format!("UPDATE {} SET name = ? WHERE guid = ?", kind.table()))
        .bind(name)
        .bind(id.to_string())
        .execute(db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("{} item {}", kind.table(), id)));
    }
    Ok(())
}

/// Entries keep their copy of the name; nothing cascades
pub async fn delete_item(db: &SqlitePool, kind: MasterKind, id: Uuid) -> Result<()> {
    let result = sqlx::query(&format!("DELETE FROM {} WHERE guid = ?", kind.table()))
        .bind(id.to_string())
        .execute(db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("{} item {}", kind.table(), id)));
    }
    Ok(())
}
