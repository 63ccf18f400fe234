//! Login, logout and the session middleware
//!
//! Protected routes require `Authorization: Bearer <token>`. EventSource
//! clients cannot set headers, so a `token` query parameter is accepted too.

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
    Extension, Json,
};
use inward_common::models::Role;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::services::Session;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: Uuid,
    pub username: String,
    pub name: String,
    pub role: Role,
}

/// POST /api/login
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let session = state
        .sessions
        .login(&request.username, &request.password)
        .await?;

    Ok(Json(LoginResponse {
        token: session.token,
        username: session.username,
        name: session.name,
        role: session.role,
    }))
}

/// POST /api/logout
pub async fn logout(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> StatusCode {
    state.sessions.logout(session.token).await;
    StatusCode::NO_CONTENT
}

/// Resolve the session token and attach the `Session` to the request
pub async fn session_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(&request)
        .or_else(|| query_token(&request))
        .ok_or_else(|| ApiError::Unauthorized("Missing session token".to_string()))?;

    let token = Uuid::parse_str(&token)
        .map_err(|_| ApiError::Unauthorized("Malformed session token".to_string()))?;

    let session = state
        .sessions
        .get(token)
        .await
        .ok_or_else(|| ApiError::Unauthorized("Session expired or unknown".to_string()))?;

    request.extensions_mut().insert(session);
    Ok(next.run(request).await)
}

fn bearer_token(request: &Request) -> Option<String> {
    request
        .headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(|t| t.trim().to_string())
}

fn query_token(request: &Request) -> Option<String> {
    request.uri().query()?.split('&').find_map(|pair| {
        pair.strip_prefix("token=")
            .filter(|t| !t.is_empty())
            .map(str::to_string)
    })
}
