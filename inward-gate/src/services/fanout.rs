//! Real-time collection fan-out
//!
//! One `watch` channel per collection holds the latest full snapshot. Every
//! mutation calls `publish`, which re-reads the collection and replaces the
//! snapshot under a per-collection lock. Because reads and version bumps are
//! serialized per collection, a later snapshot always reflects at least the
//! writes of an earlier one, and observers never see an older version after a
//! newer one.

use inward_common::events::{Snapshot, SnapshotData};
use inward_common::models::{Collection, MasterKind};
use inward_common::{time, Result};
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::db;

struct Channel {
    tx: watch::Sender<Arc<Snapshot>>,
    refresh_lock: Mutex<()>,
}

struct FanOutInner {
    db: SqlitePool,
    channels: HashMap<Collection, Channel>,
}

/// Observable store front: full snapshots per collection
#[derive(Clone)]
pub struct FanOut {
    inner: Arc<FanOutInner>,
}

impl FanOut {
    /// Load the first snapshot of every collection (version 1)
    pub async fn start(db: SqlitePool) -> Result<Self> {
        let mut channels = HashMap::new();
        for collection in Collection::ALL {
            let data = load_collection(&db, collection).await?;
            let (tx, _) = watch::channel(Arc::new(Snapshot {
                version: 1,
                taken_at: time::now(),
                data,
            }));
            channels.insert(
                collection,
                Channel {
                    tx,
                    refresh_lock: Mutex::new(()),
                },
            );
        }

        Ok(Self {
            inner: Arc::new(FanOutInner { db, channels }),
        })
    }

    fn channel(&self, collection: Collection) -> &Channel {
        // Every collection gets a channel in start()
        &self.inner.channels[&collection]
    }

    /// Latest snapshot of a collection (the session-side cached projection)
    pub fn current(&self, collection: Collection) -> Arc<Snapshot> {
        self.channel(collection).tx.borrow().clone()
    }

    /// Receiver that starts at the latest snapshot
    pub fn watch(&self, collection: Collection) -> watch::Receiver<Arc<Snapshot>> {
        self.channel(collection).tx.subscribe()
    }

    /// Re-read a collection and deliver the new snapshot to all observers
    pub async fn refresh(&self, collection: Collection) -> Result<Arc<Snapshot>> {
        let channel = self.channel(collection);
        let _guard = channel.refresh_lock.lock().await;

        let data = load_collection(&self.inner.db, collection).await?;
        let version = channel.tx.borrow().version + 1;
        let snapshot = Arc::new(Snapshot {
            version,
            taken_at: time::now(),
            data,
        });
        channel.tx.send_replace(snapshot.clone());

        debug!(
            collection = %collection,
            version,
            observers = channel.tx.receiver_count(),
            "Published snapshot"
        );
        Ok(snapshot)
    }

    /// Refresh after a committed mutation
    ///
    /// The mutation is already durable; a failed re-read is logged and the
    /// previous snapshot stays in place until the next change.
    pub async fn publish(&self, collection: Collection) {
        if let Err(e) = self.refresh(collection).await {
            warn!(collection = %collection, error = %e, "Snapshot refresh failed");
        }
    }

    /// Invoke `callback` with the current snapshot and then every newer one
    ///
    /// Delivery runs on its own task; a slow callback only skips intermediate
    /// versions, it never delays writers.
    pub fn subscribe<F>(&self, collection: Collection, mut callback: F) -> Subscription
    where
        F: FnMut(Arc<Snapshot>) + Send + 'static,
    {
        let mut rx = self.watch(collection);
        let handle = tokio::spawn(async move {
            let first = rx.borrow_and_update().clone();
            callback(first);
            while rx.changed().await.is_ok() {
                let next = rx.borrow_and_update().clone();
                callback(next);
            }
        });

        Subscription { collection, handle }
    }
}

/// Unsubscribe token returned by `FanOut::subscribe`
///
/// Dropping the token also ends delivery.
pub struct Subscription {
    collection: Collection,
    handle: JoinHandle<()>,
}

impl Subscription {
    pub fn collection(&self) -> Collection {
        self.collection
    }

    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn load_collection(db: &SqlitePool, collection: Collection) -> Result<SnapshotData> {
    Ok(match collection {
        Collection::Settings => SnapshotData::Settings(db::settings::get_settings(db).await?),
        Collection::Clients => {
            SnapshotData::Clients(db::master::list_items(db, MasterKind::Clients).await?)
        }
        Collection::Products => {
            SnapshotData::Products(db::master::list_items(db, MasterKind::Products).await?)
        }
        Collection::Users => SnapshotData::Users(db::users::list_users(db).await?),
        Collection::Entries => SnapshotData::Entries(db::entries::list_entries(db).await?),
    })
}
