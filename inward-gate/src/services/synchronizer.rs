//! Dual-write submission
//!
//! The primary store write is the durability boundary and the only thing the
//! caller waits for. The mirror export runs on a detached task afterwards; its
//! outcome is kept as a per-entry status signal and broadcast as an event, and
//! never changes the submission result.

use inward_common::events::{EventBus, GateEvent, SyncStatus};
use inward_common::models::{Entry, EntryDraft, EntryId};
use inward_common::{time, Result};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::entry_store::EntryStore;
use super::mirror_client::{MirrorRow, MirrorSink};

/// Outcome of a successful submission
pub struct Submission {
    pub entry: Entry,
    /// Initial mirror status as seen by the submitter
    pub mirror_status: SyncStatus,
    /// Detached export; dropping the handle does not cancel it
    pub mirror_task: Option<JoinHandle<SyncStatus>>,
}

/// Mirror status of the most recent submissions
///
/// Holds at most `capacity` entries; the oldest submission is evicted first.
#[derive(Debug)]
struct StatusLog {
    statuses: HashMap<EntryId, SyncStatus>,
    order: VecDeque<EntryId>,
    capacity: usize,
}

impl StatusLog {
    fn new(capacity: usize) -> Self {
        Self {
            statuses: HashMap::new(),
            order: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    fn insert(&mut self, id: EntryId, status: SyncStatus) {
        if self.statuses.insert(id, status).is_some() {
            return;
        }
        self.order.push_back(id);
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.statuses.remove(&oldest);
            }
        }
    }

    /// Overwrite only if still tracked (not evicted, not deleted)
    fn update(&mut self, id: EntryId, status: SyncStatus) {
        if let Some(current) = self.statuses.get_mut(&id) {
            *current = status;
        }
    }

    fn remove(&mut self, id: EntryId) -> bool {
        if self.statuses.remove(&id).is_none() {
            return false;
        }
        self.order.retain(|tracked| *tracked != id);
        true
    }

    fn get(&self, id: EntryId) -> Option<SyncStatus> {
        self.statuses.get(&id).copied()
    }
}

#[derive(Clone)]
pub struct Synchronizer {
    store: EntryStore,
    mirror: Option<Arc<dyn MirrorSink>>,
    event_bus: EventBus,
    statuses: Arc<RwLock<StatusLog>>,
}

impl Synchronizer {
    /// Must be called inside a tokio runtime: spawns the task that drops the
    /// status of deleted entries.
    pub fn new(
        store: EntryStore,
        mirror: Option<Arc<dyn MirrorSink>>,
        event_bus: EventBus,
        status_capacity: usize,
    ) -> Self {
        let statuses = Arc::new(RwLock::new(StatusLog::new(status_capacity)));
        tokio::spawn(forget_deleted(event_bus.subscribe(), Arc::clone(&statuses)));

        Self {
            store,
            mirror,
            event_bus,
            statuses,
        }
    }

    pub fn mirror_enabled(&self) -> bool {
        self.mirror.is_some()
    }

    /// Build, persist, then fire the mirror export
    ///
    /// Fails only on validation or the primary write; in either case no export
    /// is attempted.
    pub async fn submit(&self, draft: &EntryDraft, created_by: &str) -> Result<Submission> {
        let entry = self.store.build_entry(draft, created_by)?;
        self.store.persist_entry(&entry).await?;

        let Some(mirror) = self.mirror.clone() else {
            self.record(entry.id, SyncStatus::Skipped, None).await;
            return Ok(Submission {
                entry,
                mirror_status: SyncStatus::Skipped,
                mirror_task: None,
            });
        };

        self.record(entry.id, SyncStatus::Loading, None).await;

        let row = MirrorRow::from_entry(&entry);
        let entry_id = entry.id;
        let this = self.clone();
        let mirror_task = tokio::spawn(async move {
            match mirror.export(&row).await {
                Ok(()) => {
                    info!(entry_id = %entry_id, "Mirror export succeeded");
                    this.record(entry_id, SyncStatus::Success, None).await;
                    SyncStatus::Success
                }
                Err(e) => {
                    warn!(entry_id = %entry_id, error = %e, "Mirror export failed");
                    this.record(entry_id, SyncStatus::Error, Some(e.to_string())).await;
                    SyncStatus::Error
                }
            }
        });

        Ok(Submission {
            entry,
            mirror_status: SyncStatus::Loading,
            mirror_task: Some(mirror_task),
        })
    }

    /// Latest mirror status for a recent, still existing entry
    pub async fn sync_status(&self, id: EntryId) -> Option<SyncStatus> {
        self.statuses.read().await.get(id)
    }

    async fn record(&self, entry_id: EntryId, status: SyncStatus, detail: Option<String>) {
        {
            let mut statuses = self.statuses.write().await;
            match status {
                SyncStatus::Loading | SyncStatus::Skipped => statuses.insert(entry_id, status),
                SyncStatus::Success | SyncStatus::Error => statuses.update(entry_id, status),
            }
        }
        self.event_bus.emit_lossy(GateEvent::MirrorSyncStatus {
            entry_id,
            status,
            detail,
            timestamp: time::now(),
        });
    }
}

/// Drop statuses of deleted entries until the bus closes
async fn forget_deleted(
    mut events: broadcast::Receiver<GateEvent>,
    statuses: Arc<RwLock<StatusLog>>,
) {
    loop {
        match events.recv().await {
            Ok(GateEvent::EntryDeleted { entry_id, .. }) => {
                if statuses.write().await.remove(entry_id) {
                    debug!(entry_id = %entry_id, "Mirror status dropped for deleted entry");
                }
            }
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "Mirror status cleanup lagged behind lifecycle events");
            }
            Err(RecvError::Closed) => break,
        }
    }
}
