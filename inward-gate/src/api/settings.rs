//! Global settings (logo)

use axum::{extract::State, http::StatusCode, Extension, Json};
use inward_common::models::{Collection, Settings};
use serde::Deserialize;

use crate::error::ApiResult;
use crate::services::Session;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LogoRequest {
    /// Data URL or link; null or blank clears the logo
    pub logo: Option<String>,
}

/// GET /api/settings
pub async fn get_settings(State(state): State<AppState>) -> Json<Settings> {
    let snapshot = state.fanout.current(Collection::Settings);
    Json(snapshot.settings().cloned().unwrap_or_default())
}

/// PUT /api/settings (admin)
pub async fn update_settings(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(request): Json<LogoRequest>,
) -> ApiResult<StatusCode> {
    state
        .master
        .set_logo(&session, request.logo.as_deref())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
