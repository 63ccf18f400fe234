//! Entry store
//!
//! Authoritative entry collection. Every successful mutation emits a lifecycle
//! event and publishes a fresh Entries snapshot; the writer never waits for
//! observers.

use inward_common::events::{EventBus, GateEvent};
use inward_common::models::{Collection, Entry, EntryDraft, EntryId, QcStatus};
use inward_common::time::{self, MonotonicClock};
use inward_common::{Error, Result};
use rand::Rng;
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use super::calculator;
use super::fanout::FanOut;
use crate::db;

/// Result of a QC status overwrite
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QcChange {
    pub entry_id: EntryId,
    pub old_status: QcStatus,
    pub new_status: QcStatus,
}

#[derive(Clone)]
pub struct EntryStore {
    db: SqlitePool,
    fanout: FanOut,
    event_bus: EventBus,
    clock: Arc<MonotonicClock>,
}

impl EntryStore {
    /// Open the store; the clock resumes after the newest stored entry
    pub async fn open(db: SqlitePool, fanout: FanOut, event_bus: EventBus) -> Result<Self> {
        let latest = db::entries::latest_created_at(&db).await?;
        Ok(Self {
            db,
            fanout,
            event_bus,
            clock: Arc::new(MonotonicClock::starting_after(latest)),
        })
    }

    /// Turn form input into a complete record
    ///
    /// Fails with `Validation` when a required field is blank or a numeric
    /// field does not hold a non-negative number. Nothing is written.
    pub fn build_entry(&self, draft: &EntryDraft, created_by: &str) -> Result<Entry> {
        let vehicle_no = required(&draft.vehicle_no, "Vehicle number")?;
        let client_name = required(&draft.client_name, "Client")?;
        let product_name = required(&draft.product_name, "Product")?;

        let bags = parse_bags(&draft.bags)?;
        let bag_weight = parse_amount(&draft.bag_weight, "Bag weight")?;
        let transport_charges = parse_amount(&draft.transport_charges, "Transport charges")?;

        let created_at = self.clock.now();
        let entry_code = format!("IN-{}", rand::thread_rng().gen_range(0..10_000));

        Ok(Entry {
            id: Uuid::new_v4(),
            vehicle_no,
            client_name,
            product_name,
            lot_no: optional(&draft.lot_no),
            bags,
            bag_weight,
            total_weight: calculator::total_weight(&draft.bags, &draft.bag_weight),
            transport_charges,
            transport_mode: draft.transport_mode,
            remarks: optional(&draft.remarks),
            qc_status: QcStatus::Pending,
            plate_image: draft.plate_image.clone(),
            signature: draft.signature.clone(),
            created_at: Some(created_at),
            created_by: created_by.to_string(),
            date_string: time::date_string(created_at),
            entry_code,
        })
    }

    /// Durably write a built entry, then announce it
    pub async fn persist_entry(&self, entry: &Entry) -> Result<()> {
        if let Err(e) = db::entries::insert_entry(&self.db, entry).await {
            error!(entry_id = %entry.id, error = %e, "Failed to persist entry");
            return Err(e);
        }

        info!(
            entry_id = %entry.id,
            entry_code = %entry.entry_code,
            vehicle = %entry.vehicle_no,
            "Entry saved"
        );

        self.event_bus.emit_lossy(GateEvent::EntryCreated {
            entry_id: entry.id,
            entry_code: entry.entry_code.clone(),
            created_by: entry.created_by.clone(),
            timestamp: time::now(),
        });
        self.fanout.publish(Collection::Entries).await;
        Ok(())
    }

    /// Validate, build and persist in one step
    pub async fn create_entry(&self, draft: &EntryDraft, created_by: &str) -> Result<EntryId> {
        let entry = self.build_entry(draft, created_by)?;
        self.persist_entry(&entry).await?;
        Ok(entry.id)
    }

    /// All entries, newest first
    pub async fn list_entries(&self) -> Result<Vec<Entry>> {
        db::entries::list_entries(&self.db).await
    }

    pub async fn get_entry(&self, id: EntryId) -> Result<Entry> {
        db::entries::get_entry(&self.db, id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Entry {}", id)))
    }

    /// Overwrite qc_status only (last write wins)
    pub async fn update_status(&self, id: EntryId, status: QcStatus) -> Result<QcChange> {
        let old_status = db::entries::update_status(&self.db, id, status).await?;

        info!(entry_id = %id, from = %old_status, to = %status, "QC status updated");
        self.event_bus.emit_lossy(GateEvent::QcStatusChanged {
            entry_id: id,
            old_status,
            new_status: status,
            timestamp: time::now(),
        });
        self.fanout.publish(Collection::Entries).await;

        Ok(QcChange {
            entry_id: id,
            old_status,
            new_status: status,
        })
    }

    /// Administrative hard delete
    pub async fn delete_entry(&self, id: EntryId) -> Result<()> {
        db::entries::delete_entry(&self.db, id).await?;

        info!(entry_id = %id, "Entry deleted");
        self.event_bus.emit_lossy(GateEvent::EntryDeleted {
            entry_id: id,
            timestamp: time::now(),
        });
        self.fanout.publish(Collection::Entries).await;
        Ok(())
    }
}

fn required(raw: &str, label: &str) -> Result<String> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(Error::Validation(format!("{} is required", label)));
    }
    Ok(value.to_string())
}

fn optional(raw: &str) -> Option<String> {
    let value = raw.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn parse_bags(raw: &str) -> Result<Option<u32>> {
    let value = raw.trim();
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse::<u32>()
        .map(Some)
        .map_err(|_| Error::Validation(format!("Bags must be a whole number, got '{}'", value)))
}

fn parse_amount(raw: &str, label: &str) -> Result<Option<f64>> {
    let value = raw.trim();
    if value.is_empty() {
        return Ok(None);
    }
    match value.parse::<f64>() {
        Ok(amount) if amount.is_finite() && amount >= 0.0 => Ok(Some(amount)),
        _ => Err(Error::Validation(format!(
            "{} must be a non-negative number, got '{}'",
            label, value
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::temp_db;
    use inward_common::models::TransportMode;
    use tempfile::TempDir;

    async fn open_store() -> (TempDir, EntryStore, EventBus) {
        let (dir, db) = temp_db().await;
        let fanout = FanOut::start(db.clone()).await.unwrap();
        let event_bus = EventBus::new(32);
        let store = EntryStore::open(db, fanout, event_bus.clone()).await.unwrap();
        (dir, store, event_bus)
    }

    fn draft(vehicle: &str, client: &str, product: &str) -> EntryDraft {
        EntryDraft {
            vehicle_no: vehicle.to_string(),
            client_name: client.to_string(),
            product_name: product.to_string(),
            bags: "10".to_string(),
            bag_weight: "50".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_build_entry_derives_fields() {
        let (_dir, store, _bus) = open_store().await;
        let mut input = draft("GJ01AB1234", "Spice Traders Inc", "Turmeric");
        input.transport_mode = TransportMode::ThirdParty;
        input.lot_no = "  ".to_string();

        let entry = store.build_entry(&input, "Gate Staff").unwrap();

        assert_eq!(entry.total_weight, 500.0);
        assert_eq!(entry.bags, Some(10));
        assert_eq!(entry.bag_weight, Some(50.0));
        assert_eq!(entry.qc_status, QcStatus::Pending);
        assert_eq!(entry.transport_mode, TransportMode::ThirdParty);
        assert_eq!(entry.lot_no, None);
        assert_eq!(entry.created_by, "Gate Staff");
        assert!(entry.entry_code.starts_with("IN-"));
        let created_at = entry.created_at.unwrap();
        assert_eq!(entry.date_string, created_at.format("%Y-%m-%d").to_string());
    }

    #[tokio::test]
    async fn test_missing_required_fields_never_reach_store() {
        let (_dir, store, _bus) = open_store().await;

        for input in [
            draft("", "Spice Traders Inc", "Turmeric"),
            draft("GJ01AB1234", "   ", "Turmeric"),
            draft("GJ01AB1234", "Spice Traders Inc", ""),
        ] {
            let result = store.create_entry(&input, "Gate Staff").await;
            assert!(matches!(result, Err(Error::Validation(_))));
        }

        assert!(store.list_entries().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rejects_malformed_numbers() {
        let (_dir, store, _bus) = open_store().await;

        let mut negative = draft("GJ01AB1234", "Spice Traders Inc", "Turmeric");
        negative.bag_weight = "-5".to_string();
        assert!(matches!(store.build_entry(&negative, "x"), Err(Error::Validation(_))));

        let mut fractional_bags = draft("GJ01AB1234", "Spice Traders Inc", "Turmeric");
        fractional_bags.bags = "2.5".to_string();
        assert!(matches!(store.build_entry(&fractional_bags, "x"), Err(Error::Validation(_))));

        let mut text_charges = draft("GJ01AB1234", "Spice Traders Inc", "Turmeric");
        text_charges.transport_charges = "free".to_string();
        assert!(matches!(store.build_entry(&text_charges, "x"), Err(Error::Validation(_))));
    }

    #[tokio::test]
    async fn test_blank_quantities_give_zero_total() {
        let (_dir, store, _bus) = open_store().await;
        let mut input = draft("GJ01AB1234", "Spice Traders Inc", "Turmeric");
        input.bags.clear();

        let entry = store.build_entry(&input, "Gate Staff").unwrap();
        assert_eq!(entry.bags, None);
        assert_eq!(entry.total_weight, 0.0);
    }

    #[tokio::test]
    async fn test_created_entry_listed_once_and_first() {
        let (_dir, store, _bus) = open_store().await;

        let first = store.create_entry(&draft("GJ01AA0001", "Farm Fresh Co", "Coriander"), "a").await.unwrap();
        let second = store.create_entry(&draft("GJ01AA0002", "Farm Fresh Co", "Coriander"), "a").await.unwrap();

        let entries = store.list_entries().await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, second);
        assert_eq!(entries[1].id, first);
        assert!(entries[0].created_at > entries[1].created_at);
        assert_eq!(entries.iter().filter(|e| e.id == second).count(), 1);
    }

    #[tokio::test]
    async fn test_create_publishes_snapshot_and_event() {
        let (_dir, store, bus) = open_store().await;
        let mut events = bus.subscribe();
        let before = store.fanout.current(Collection::Entries).version;

        let id = store.create_entry(&draft("GJ01AB1234", "Spice Traders Inc", "Turmeric"), "a").await.unwrap();

        let snapshot = store.fanout.current(Collection::Entries);
        assert!(snapshot.version > before);
        assert_eq!(snapshot.entries().unwrap()[0].id, id);
        match events.try_recv().unwrap() {
            GateEvent::EntryCreated { entry_id, .. } => assert_eq!(entry_id, id),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_last_status_write_wins_and_other_fields_unchanged() {
        let (_dir, store, _bus) = open_store().await;
        let id = store.create_entry(&draft("GJ01AB1234", "Spice Traders Inc", "Turmeric"), "a").await.unwrap();
        let original = store.get_entry(id).await.unwrap();

        let first = store.update_status(id, QcStatus::Approved).await.unwrap();
        assert_eq!(first.old_status, QcStatus::Pending);
        let second = store.update_status(id, QcStatus::Rejected).await.unwrap();
        assert_eq!(second.old_status, QcStatus::Approved);

        let updated = store.get_entry(id).await.unwrap();
        assert_eq!(updated.qc_status, QcStatus::Rejected);
        assert_eq!(Entry { qc_status: original.qc_status, ..updated }, original);
    }

    #[tokio::test]
    async fn test_update_and_delete_unknown_id() {
        let (_dir, store, _bus) = open_store().await;
        let missing = Uuid::new_v4();

        assert!(matches!(
            store.update_status(missing, QcStatus::Approved).await,
            Err(Error::NotFound(_))
        ));
        assert!(matches!(store.delete_entry(missing).await, Err(Error::NotFound(_))));
    }
}
