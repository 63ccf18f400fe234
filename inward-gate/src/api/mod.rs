//! HTTP API handlers for inward-gate

pub mod auth;
pub mod entries;
pub mod health;
pub mod master;
pub mod settings;
pub mod sse;

pub use auth::{login, logout, session_middleware};
pub use entries::{
    calc_total, create_entry, delete_entry, export_entries, list_entries, sync_status,
    update_status,
};
pub use health::health_routes;
pub use master::{
    add_client, add_product, create_user, delete_client, delete_product, delete_user,
    list_clients, list_products, list_users, rename_client, rename_product,
};
pub use settings::{get_settings, update_settings};
pub use sse::event_stream;
