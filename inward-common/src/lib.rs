//! # Inward Common Library
//!
//! Shared code for the inward gate register including:
//! - Domain models (entries, master data, users, settings)
//! - Event types (GateEvent enum) and the EventBus
//! - Database initialization
//! - Configuration loading
//! - Timestamp utilities

pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod models;
pub mod time;

pub use error::{Error, Result};
