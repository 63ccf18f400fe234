//! Entry endpoints
//!
//! Reads are served from the latest Entries snapshot, the same projection
//! that SSE observers receive.

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::Utc;
use inward_common::events::SyncStatus;
use inward_common::models::{deserialize_text_or_number, Collection, Entry, EntryDraft, EntryId, QcStatus};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ApiError, ApiResult};
use crate::services::{calculator, qc, query, EntryFilter, QcAction, Session};
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEntryResponse {
    pub id: EntryId,
    pub entry_code: String,
    pub message: String,
    pub mirror_status: SyncStatus,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: QcStatus,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub entry_id: EntryId,
    pub old_status: QcStatus,
    pub new_status: QcStatus,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatusResponse {
    pub entry_id: EntryId,
    pub status: SyncStatus,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CalcRequest {
    #[serde(deserialize_with = "deserialize_text_or_number")]
    pub bags: String,
    #[serde(deserialize_with = "deserialize_text_or_number")]
    pub bag_weight: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalcResponse {
    pub total_weight: f64,
}

fn filtered_entries(state: &AppState, filter: &EntryFilter) -> Vec<Entry> {
    let snapshot = state.fanout.current(Collection::Entries);
    query::filter(snapshot.entries().unwrap_or(&[]), &filter.search, &filter.date)
}

/// GET /api/entries?search=&date=
pub async fn list_entries(
    State(state): State<AppState>,
    Query(filter): Query<EntryFilter>,
) -> Json<Vec<Entry>> {
    Json(filtered_entries(&state, &filter))
}

/// POST /api/entries
///
/// Responds once the entry is durable; the mirror export continues in the
/// background.
pub async fn create_entry(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(draft): Json<EntryDraft>,
) -> ApiResult<(StatusCode, Json<CreateEntryResponse>)> {
    let submission = state.sync.submit(&draft, &session.name).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateEntryResponse {
            id: submission.entry.id,
            entry_code: submission.entry.entry_code,
            message: "Entry saved".to_string(),
            mirror_status: submission.mirror_status,
        }),
    ))
}

/// PUT /api/entries/:id/status
pub async fn update_status(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<EntryId>,
    Json(request): Json<StatusRequest>,
) -> ApiResult<Json<StatusResponse>> {
    let action = QcAction::for_status(request.status)?;
    let change = qc::apply(&state.entries, state.qc_policy, session.role, id, action).await?;

    Ok(Json(StatusResponse {
        entry_id: change.entry_id,
        old_status: change.old_status,
        new_status: change.new_status,
    }))
}

/// DELETE /api/entries/:id (admin)
pub async fn delete_entry(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<EntryId>,
) -> ApiResult<StatusCode> {
    session.require_admin()?;
    state.entries.delete_entry(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/entries/export?search=&date=
pub async fn export_entries(
    State(state): State<AppState>,
    Query(filter): Query<EntryFilter>,
) -> ApiResult<Response> {
    let entries = filtered_entries(&state, &filter);
    let csv = query::export_csv(&entries)?;
    let filename = query::export_filename(Utc::now().date_naive());
    debug!(rows = entries.len(), %filename, "CSV export");

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        csv,
    )
        .into_response())
}

/// GET /api/entries/:id/sync
pub async fn sync_status(
    State(state): State<AppState>,
    Path(id): Path<EntryId>,
) -> ApiResult<Json<SyncStatusResponse>> {
    let status = state
        .sync
        .sync_status(id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("No mirror status for entry {}", id)))?;

    Ok(Json(SyncStatusResponse { entry_id: id, status }))
}

/// POST /api/calc/total
pub async fn calc_total(Json(request): Json<CalcRequest>) -> Json<CalcResponse> {
    Json(CalcResponse {
        total_weight: calculator::total_weight(&request.bags, &request.bag_weight),
    })
}
