//! Database access layer for inward-gate
//!
//! Thin query functions over the primary store. They never publish snapshots;
//! the services layer calls the fan-out after each successful mutation.

pub mod entries;
pub mod master;
pub mod seed;
pub mod settings;
pub mod users;

pub use inward_common::db::init_database;

use inward_common::{Error, Result};
use uuid::Uuid;

/// Parse a stored guid column
pub(crate) fn parse_guid(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|e| Error::Internal(format!("Corrupt guid '{}': {}", raw, e)))
}
