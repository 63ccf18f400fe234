//! Event types for the inward register event system
//!
//! Two kinds of traffic leave the core:
//! - Collection snapshots (full state of one collection, versioned)
//! - Lifecycle events (entry created, QC status changed, mirror sync status)
//!
//! Snapshots travel through the per-collection fan-out channels; lifecycle events
//! travel through the `EventBus`. Both can be serialized for SSE transmission.

use crate::models::{Collection, Entry, EntryId, MasterItem, QcStatus, Settings, User};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Full contents of one collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "collection", content = "items")]
pub enum SnapshotData {
    Settings(Settings),
    Clients(Vec<MasterItem>),
    Products(Vec<MasterItem>),
    Users(Vec<User>),
    Entries(Vec<Entry>),
}

impl SnapshotData {
    pub fn collection(&self) -> Collection {
        match self {
            SnapshotData::Settings(_) => Collection::Settings,
            SnapshotData::Clients(_) => Collection::Clients,
            SnapshotData::Products(_) => Collection::Products,
            SnapshotData::Users(_) => Collection::Users,
            SnapshotData::Entries(_) => Collection::Entries,
        }
    }

    /// Settings is a single record and never counts as empty
    pub fn is_empty(&self) -> bool {
        match self {
            SnapshotData::Settings(_) => false,
            SnapshotData::Clients(items) | SnapshotData::Products(items) => items.is_empty(),
            SnapshotData::Users(users) => users.is_empty(),
            SnapshotData::Entries(entries) => entries.is_empty(),
        }
    }
}

/// Versioned collection snapshot
///
/// Versions strictly increase per collection; an observer never receives a
/// lower version after a higher one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u64,
    pub taken_at: DateTime<Utc>,
    pub data: SnapshotData,
}

impl Snapshot {
    pub fn collection(&self) -> Collection {
        self.data.collection()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn entries(&self) -> Option<&[Entry]> {
        match &self.data {
            SnapshotData::Entries(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn master_items(&self) -> Option<&[MasterItem]> {
        match &self.data {
            SnapshotData::Clients(items) | SnapshotData::Products(items) => Some(items),
            _ => None,
        }
    }

    pub fn users(&self) -> Option<&[User]> {
        match &self.data {
            SnapshotData::Users(users) => Some(users),
            _ => None,
        }
    }

    pub fn settings(&self) -> Option<&Settings> {
        match &self.data {
            SnapshotData::Settings(settings) => Some(settings),
            _ => None,
        }
    }
}

/// Outcome signal of the best-effort mirror export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    /// Export task issued, outcome unknown
    Loading,
    Success,
    Error,
    /// No mirror endpoint configured
    Skipped,
}

/// Inward register lifecycle events
///
/// Events are broadcast via EventBus and can be serialized for SSE transmission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GateEvent {
    /// Entry durably written to the primary store
    ///
    /// Triggers:
    /// - SSE: "saved" feedback to the submitting session
    EntryCreated {
        entry_id: EntryId,
        entry_code: String,
        created_by: String,
        timestamp: DateTime<Utc>,
    },

    /// QC status overwritten (last write wins)
    QcStatusChanged {
        entry_id: EntryId,
        old_status: QcStatus,
        new_status: QcStatus,
        timestamp: DateTime<Utc>,
    },

    /// Entry removed administratively
    EntryDeleted {
        entry_id: EntryId,
        timestamp: DateTime<Utc>,
    },

    /// Mirror export status changed
    ///
    /// Feedback only: never affects whether the entry was saved.
    MirrorSyncStatus {
        entry_id: EntryId,
        status: SyncStatus,
        /// Failure description when status is Error
        detail: Option<String>,
        timestamp: DateTime<Utc>,
    },
}

impl GateEvent {
    /// Get event type as string for filtering
    pub fn event_type(&self) -> &'static str {
        match self {
            GateEvent::EntryCreated { .. } => "EntryCreated",
            GateEvent::QcStatusChanged { .. } => "QcStatusChanged",
            GateEvent::EntryDeleted { .. } => "EntryDeleted",
            GateEvent::MirrorSyncStatus { .. } => "MirrorSyncStatus",
        }
    }
}

/// Broadcast channel for gate lifecycle events
///
/// Publishing never waits on receivers. A receiver that falls more than
/// `capacity` events behind gets `RecvError::Lagged` and resumes from the
/// oldest buffered event.
///
/// # Examples
///
/// ```
/// use inward_common::events::{EventBus, GateEvent, SyncStatus};
///
/// let event_bus = EventBus::new(100);
/// let mut rx = event_bus.subscribe();
///
/// event_bus.emit_lossy(GateEvent::MirrorSyncStatus {
///     entry_id: uuid::Uuid::new_v4(),
///     status: SyncStatus::Loading,
///     detail: None,
///     timestamp: chrono::Utc::now(),
/// });
///
/// assert!(rx.try_recv().is_ok());
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<GateEvent>,
    capacity: usize,
}

impl EventBus {
    /// `capacity` bounds the buffer shared by all receivers
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Receiver for events emitted from now on
    pub fn subscribe(&self) -> broadcast::Receiver<GateEvent> {
        self.tx.subscribe()
    }

    /// Returns the number of receivers reached, or `Err` when there are none
    #[allow(clippy::result_large_err)]
    pub fn emit(&self, event: GateEvent) -> Result<usize, broadcast::error::SendError<GateEvent>> {
        self.tx.send(event)
    }

    /// Emit without caring whether anyone is listening
    pub fn emit_lossy(&self, event: GateEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
