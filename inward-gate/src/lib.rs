//! inward-gate library - warehouse inward register
//!
//! Records goods-receipt entries at the gate, pushes live collection snapshots
//! to every connected session and mirrors new entries to an external tabular
//! endpoint on a best-effort basis.

use axum::Router;
use inward_common::config::QcPolicy;
use inward_common::events::EventBus;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod services;

pub use error::{ApiError, ApiResult};

use services::{EntryStore, FanOut, MasterData, MirrorSink, SessionRegistry, Synchronizer};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    /// Lifecycle events (entry created, QC changed, mirror status)
    pub event_bus: EventBus,
    /// Live collection snapshots
    pub fanout: FanOut,
    pub entries: EntryStore,
    pub sync: Synchronizer,
    pub master: MasterData,
    pub sessions: SessionRegistry,
    pub qc_policy: QcPolicy,
}

impl AppState {
    /// Load first snapshots and wire the services together
    ///
    /// `mirror` of None disables the mirror export; submissions then report
    /// `skipped`. `sync_status_capacity` bounds how many recent entries keep
    /// a queryable mirror status.
    pub async fn new(
        db: SqlitePool,
        event_capacity: usize,
        sync_status_capacity: usize,
        qc_policy: QcPolicy,
        mirror: Option<Arc<dyn MirrorSink>>,
    ) -> inward_common::Result<Self> {
        let event_bus = EventBus::new(event_capacity);
        let fanout = FanOut::start(db.clone()).await?;
        let entries = EntryStore::open(db.clone(), fanout.clone(), event_bus.clone()).await?;
        let sync = Synchronizer::new(
            entries.clone(),
            mirror,
            event_bus.clone(),
            sync_status_capacity,
        );
        let sessions = SessionRegistry::new(db.clone());
        let master = MasterData::new(db.clone(), fanout.clone(), sessions.clone());

        Ok(Self {
            db,
            event_bus,
            fanout,
            entries,
            sync,
            master,
            sessions,
            qc_policy,
        })
    }
}

/// Build application router
///
/// Health and login are public; everything else needs a session token.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{delete, get, post, put};

    let protected = Router::new()
        .route("/api/logout", post(api::logout))
        .route("/api/entries", get(api::list_entries).post(api::create_entry))
        .route("/api/entries/export", get(api::export_entries))
        .route("/api/entries/:id", delete(api::delete_entry))
        .route("/api/entries/:id/status", put(api::update_status))
        .route("/api/entries/:id/sync", get(api::sync_status))
        .route("/api/calc/total", post(api::calc_total))
        .route("/api/clients", get(api::list_clients).post(api::add_client))
        .route("/api/clients/:id", put(api::rename_client).delete(api::delete_client))
        .route("/api/products", get(api::list_products).post(api::add_product))
        .route("/api/products/:id", put(api::rename_product).delete(api::delete_product))
        .route("/api/users", get(api::list_users).post(api::create_user))
        .route("/api/users/:id", delete(api::delete_user))
        .route("/api/settings", get(api::get_settings).put(api::update_settings))
        .route("/events", get(api::event_stream))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::session_middleware,
        ));

    let public = Router::new()
        .route("/api/login", post(api::login))
        .merge(api::health_routes());

    Router::new()
        .merge(protected)
        .merge(public)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
