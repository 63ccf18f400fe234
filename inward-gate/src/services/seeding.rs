//! Default master data
//!
//! Runs when the first snapshot of Clients or Users is empty. The database
//! guard in `db::seed` makes it a one-time operation even with concurrent
//! callers or later restarts.

use inward_common::models::{Collection, Role};
use inward_common::Result;
use sqlx::SqlitePool;
use tracing::info;

use super::fanout::FanOut;
use crate::db;

pub const DEFAULT_CLIENTS: &[&str] = &["Spice Traders Inc", "Global Foods Ltd", "Farm Fresh Co"];

pub const DEFAULT_PRODUCTS: &[&str] = &["Turmeric", "Chili Powder", "Cumin Seeds", "Coriander"];

/// (username, password, role, display name)
pub const DEFAULT_USERS: &[(&str, &str, Role, &str)] = &[
    ("admin", "123", Role::Admin, "System Admin"),
    ("staff", "123", Role::Staff, "Gate Staff"),
];

/// What a seeding pass inserted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub master_data: bool,
    pub users: bool,
}

/// Seed defaults for collections whose current snapshot is empty
pub async fn seed_on_first_snapshot(db: &SqlitePool, fanout: &FanOut) -> Result<SeedReport> {
    let mut report = SeedReport::default();

    if fanout.current(Collection::Clients).is_empty() {
        report.master_data = db::seed::seed_master_data(db, DEFAULT_CLIENTS, DEFAULT_PRODUCTS).await?;
        if report.master_data {
            info!(
                clients = DEFAULT_CLIENTS.len(),
                products = DEFAULT_PRODUCTS.len(),
                "Seeded default clients and products"
            );
            fanout.publish(Collection::Clients).await;
            fanout.publish(Collection::Products).await;
        }
    }

    if fanout.current(Collection::Users).is_empty() {
        report.users = db::seed::seed_users(db, DEFAULT_USERS).await?;
        if report.users {
            info!(users = DEFAULT_USERS.len(), "Seeded default users");
            fanout.publish(Collection::Users).await;
        }
    }

    Ok(report)
}
