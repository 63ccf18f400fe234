//! Entry table queries

use chrono::{DateTime, Utc};
use inward_common::models::{Entry, EntryId, QcStatus};
use inward_common::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

const ENTRY_COLUMNS: &str = "guid, vehicle_no, client_name, product_name, lot_no, bags, bag_weight, \
     total_weight, transport_charges, transport_mode, remarks, qc_status, plate_image, signature, \
     created_at, created_by, date_string, entry_code";

/// Insert a fully built entry
pub async fn insert_entry(db: &SqlitePool, entry: &Entry) -> Result<()> {
    sqlx::query(&format!(
        "INSERT INTO entries ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        ENTRY_COLUMNS
    ))
    .bind(entry.id.to_string())
    .bind(&entry.vehicle_no)
    .bind(&entry.client_name)
    .bind(&entry.product_name)
    .bind(&entry.lot_no)
    .bind(entry.bags.map(i64::from))
    .bind(entry.bag_weight)
    .bind(entry.total_weight)
    .bind(entry.transport_charges)
    .bind(entry.transport_mode.as_str())
    .bind(&entry.remarks)
    .bind(entry.qc_status.as_str())
    .bind(&entry.plate_image)
    .bind(&entry.signature)
    .bind(entry.created_at.map(|t| t.timestamp_micros()))
    .bind(&entry.created_by)
    .bind(&entry.date_string)
    .bind(&entry.entry_code)
    .execute(db)
    .await?;

    Ok(())
}

/// All entries, newest first; a missing timestamp sorts as the epoch
pub async fn list_entries(db: &SqlitePool) -> Result<Vec<Entry>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM entries ORDER BY COALESCE(created_at, 0) DESC, rowid DESC",
        ENTRY_COLUMNS
    ))
    .fetch_all(db)
    .await?;

    rows.iter().map(entry_from_row).collect()
}

pub async fn get_entry(db: &SqlitePool, id: EntryId) -> Result<Option<Entry>> {
    let row = sqlx::query(&format!("SELECT {} FROM entries WHERE guid = ?", ENTRY_COLUMNS))
        .bind(id.to_string())
        .fetch_optional(db)
        .await?;

    row.as_ref().map(entry_from_row).transpose()
}

/// Overwrite qc_status only; returns the previous status
pub async fn update_status(db: &SqlitePool, id: EntryId, status: QcStatus) -> Result<QcStatus> {
    let mut tx = db.begin().await?;

    let previous: Option<String> = sqlx::query_scalar("SELECT qc_status FROM entries WHERE guid = ?")
        .bind(id.to_string())
        .fetch_optional(&mut *tx)
        .await?;
    let previous = previous.ok_or_else(|| Error::NotFound(format!("Entry {}", id)))?;

    sqlx::query("UPDATE entries SET qc_status = ? WHERE guid = ?")
        .bind(status.as_str())
        .bind(id.to_string())
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    previous.parse()
}

pub async fn delete_entry(db: &SqlitePool, id: EntryId) -> Result<()> {
    let result = sqlx::query("DELETE FROM entries WHERE guid = ?")
        .bind(id.to_string())
        .execute(db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Entry {}", id)));
    }
    Ok(())
}

/// Newest stored creation timestamp, used to keep the clock monotonic across restarts
pub async fn latest_created_at(db: &SqlitePool) -> Result<Option<DateTime<Utc>>> {
    let micros: Option<i64> = sqlx::query_scalar("SELECT MAX(created_at) FROM entries")
        .fetch_one(db)
        .await?;
    Ok(micros.and_then(DateTime::from_timestamp_micros))
}

fn entry_from_row(row: &SqliteRow) -> Result<Entry> {
    let guid: String = row.try_get("guid")?;
    let bags: Option<i64> = row.try_get("bags")?;
    let transport_mode: String = row.try_get("transport_mode")?;
    let qc_status: String = row.try_get("qc_status")?;
    let created_at: Option<i64> = row.try_get("created_at")?;

    Ok(Entry {
        id: super::parse_guid(&guid)?,
        vehicle_no: row.try_get("vehicle_no")?,
        client_name: row.try_get("client_name")?,
        product_name: row.try_get("product_name")?,
        lot_no: row.try_get("lot_no")?,
        bags: bags
            .map(|b| u32::try_from(b).map_err(|_| Error::Internal(format!("Corrupt bag count: {}", b))))
            .transpose()?,
        bag_weight: row.try_get("bag_weight")?,
        total_weight: row.try_get("total_weight")?,
        transport_charges: row.try_get("transport_charges")?,
        transport_mode: transport_mode.parse()?,
        remarks: row.try_get("remarks")?,
        qc_status: qc_status.parse()?,
        plate_image: row.try_get("plate_image")?,
        signature: row.try_get("signature")?,
        created_at: created_at.and_then(DateTime::from_timestamp_micros),
        created_by: row.try_get("created_by")?,
        date_string: row.try_get("date_string")?,
        entry_code: row.try_get("entry_code")?,
    })
}
