//! Tabular mirror export client
//!
//! Write-only: one JSON object per call, no retry. Only the transport outcome
//! counts; a completed round-trip is a success whatever the reply says.

use async_trait::async_trait;
use chrono::Local;
use inward_common::models::Entry;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

const USER_AGENT: &str = concat!("inward-gate/", env!("CARGO_PKG_VERSION"));

/// Mirror export errors
#[derive(Debug, Error)]
pub enum MirrorExportError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Serialize error: {0}")]
    Serialize(String),
}

/// Flattened, text-only projection of an entry
///
/// Binary fields (plate image, signature) are never exported.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MirrorRow {
    pub date: String,
    pub time: String,
    pub vehicle_no: String,
    pub client: String,
    pub product: String,
    pub bags: String,
    pub total_weight: f64,
    pub transport_mode: String,
    pub charges: String,
    pub lot_no: String,
    pub remarks: String,
}

impl MirrorRow {
    /// Project an entry; date and time are local wall-clock at export
    pub fn from_entry(entry: &Entry) -> Self {
        let now = Local::now();
        Self {
            date: now.format("%Y-%m-%d").to_string(),
            time: now.format("%H:%M:%S").to_string(),
            vehicle_no: entry.vehicle_no.clone(),
            client: entry.client_name.clone(),
            product: entry.product_name.clone(),
            bags: entry.bags.map(|b| b.to_string()).unwrap_or_default(),
            total_weight: entry.total_weight,
            transport_mode: entry.transport_mode.to_string(),
            charges: entry
                .transport_charges
                .map(|c| c.to_string())
                .unwrap_or_default(),
            lot_no: entry.lot_no.clone().unwrap_or_default(),
            remarks: entry.remarks.clone().unwrap_or_default(),
        }
    }
}

/// Destination of mirror rows
#[async_trait]
pub trait MirrorSink: Send + Sync {
    async fn export(&self, row: &MirrorRow) -> Result<(), MirrorExportError>;
}

/// HTTP endpoint mirror
pub struct HttpMirror {
    http_client: reqwest::Client,
    url: String,
}

impl HttpMirror {
    /// The timeout bounds the single attempt
    pub fn new(url: String, timeout: Duration) -> Result<Self, MirrorExportError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| MirrorExportError::Network(e.to_string()))?;

        Ok(Self { http_client, url })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl MirrorSink for HttpMirror {
    async fn export(&self, row: &MirrorRow) -> Result<(), MirrorExportError> {
        let body =
            serde_json::to_vec(row).map_err(|e| MirrorExportError::Serialize(e.to_string()))?;

        tracing::debug!(url = %self.url, vehicle = %row.vehicle_no, "Exporting row to mirror");

        let response = self
            .http_client
            .post(&self.url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| MirrorExportError::Network(e.to_string()))?;

        // Reply status is not consulted
        tracing::debug!(url = %self.url, status = %response.status(), "Mirror request completed");
        Ok(())
    }
}
