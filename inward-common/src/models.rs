//! Domain models for the inward register
//!
//! Entries reference clients and products by name (plain text copy), not by id,
//! so historical entries are unaffected by later master data edits or deletions.

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Store-assigned entry identifier
pub type EntryId = Uuid;

/// Quality-check outcome of an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum QcStatus {
    /// Initial state of every entry
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl QcStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QcStatus::Pending => "Pending",
            QcStatus::Approved => "Approved",
            QcStatus::Rejected => "Rejected",
        }
    }
}

impl fmt::Display for QcStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QcStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Pending" => Ok(QcStatus::Pending),
            "Approved" => Ok(QcStatus::Approved),
            "Rejected" => Ok(QcStatus::Rejected),
            other => Err(Error::Validation(format!("Unknown QC status: {}", other))),
        }
    }
}

/// How the goods arrived at the gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TransportMode {
    #[default]
    #[serde(rename = "Client Transport", alias = "Client's Transport")]
    ClientTransport,
    Porter,
    #[serde(rename = "Own Vehicle")]
    OwnVehicle,
    #[serde(rename = "Third Party")]
    ThirdParty,
}

impl TransportMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportMode::ClientTransport => "Client Transport",
            TransportMode::Porter => "Porter",
            TransportMode::OwnVehicle => "Own Vehicle",
            TransportMode::ThirdParty => "Third Party",
        }
    }
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransportMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Client Transport" | "Client's Transport" => Ok(TransportMode::ClientTransport),
            "Porter" => Ok(TransportMode::Porter),
            "Own Vehicle" => Ok(TransportMode::OwnVehicle),
            "Third Party" => Ok(TransportMode::ThirdParty),
            other => Err(Error::Validation(format!("Unknown transport mode: {}", other))),
        }
    }
}

/// One inward goods-receipt record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub id: EntryId,
    pub vehicle_no: String,
    pub client_name: String,
    pub product_name: String,
    pub lot_no: Option<String>,
    pub bags: Option<u32>,
    pub bag_weight: Option<f64>,
    /// bags * bag_weight at creation; never recomputed
    pub total_weight: f64,
    pub transport_charges: Option<f64>,
    pub transport_mode: TransportMode,
    pub remarks: Option<String>,
    pub qc_status: QcStatus,
    pub plate_image: Option<String>,
    pub signature: Option<String>,
    /// None only for records imported without a timestamp; sorts as the epoch
    pub created_at: Option<DateTime<Utc>>,
    pub created_by: String,
    /// `YYYY-MM-DD` (UTC) of creation, used for date filtering
    pub date_string: String,
    pub entry_code: String,
}

/// Raw entry form input
///
/// Numeric fields stay as text until submission: the live total treats anything
/// unparsable as zero, while submission rejects it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EntryDraft {
    pub vehicle_no: String,
    pub client_name: String,
    pub product_name: String,
    pub lot_no: String,
    #[serde(deserialize_with = "deserialize_text_or_number")]
    pub bags: String,
    #[serde(deserialize_with = "deserialize_text_or_number")]
    pub bag_weight: String,
    #[serde(deserialize_with = "deserialize_text_or_number")]
    pub transport_charges: String,
    pub transport_mode: TransportMode,
    pub remarks: String,
    pub plate_image: Option<String>,
    /// Captured at submission only; entries have no path to add one later
    pub signature: Option<String>,
}

/// Accept either a JSON string or a JSON number for a form field
pub fn deserialize_text_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Null => Ok(String::new()),
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(de::Error::custom(format!(
            "expected text or number, got {}",
            other
        ))),
    }
}

/// Client or product reference entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasterItem {
    pub id: Uuid,
    pub name: String,
}

/// Which master list a `MasterItem` belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MasterKind {
    Clients,
    Products,
}

impl MasterKind {
    /// Backing table name
    pub fn table(&self) -> &'static str {
        match self {
            MasterKind::Clients => "clients",
            MasterKind::Products => "products",
        }
    }

    pub fn collection(&self) -> Collection {
        match self {
            MasterKind::Clients => Collection::Clients,
            MasterKind::Products => Collection::Products,
        }
    }
}

/// Session role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Staff,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Staff => "staff",
        }
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "admin" => Ok(Role::Admin),
            "staff" => Ok(Role::Staff),
            other => Err(Error::Validation(format!("Unknown role: {}", other))),
        }
    }
}

/// Username that can never be deleted
pub const PROTECTED_USERNAME: &str = "admin";

/// Application user
///
/// Passwords are compared as plain values. They are never serialized so that
/// user snapshots pushed to observers do not carry them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    #[serde(skip_serializing, default)]
    pub password: String,
    pub role: Role,
    pub name: String,
}

/// Global settings record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Logo image reference (data URL or link)
    pub logo: Option<String>,
}

/// Observable collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Collection {
    Settings,
    Clients,
    Products,
    Users,
    Entries,
}

impl Collection {
    pub const ALL: [Collection; 5] = [
        Collection::Settings,
        Collection::Clients,
        Collection::Products,
        Collection::Users,
        Collection::Entries,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Settings => "Settings",
            Collection::Clients => "Clients",
            Collection::Products => "Products",
            Collection::Users => "Users",
            Collection::Entries => "Entries",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
