//! Clients, products and users endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use inward_common::models::{Collection, MasterItem, MasterKind, User};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiResult;
use crate::services::{NewUser, Session};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct NameRequest {
    pub name: String,
}

fn current_items(state: &AppState, kind: MasterKind) -> Vec<MasterItem> {
    state
        .fanout
        .current(kind.collection())
        .master_items()
        .map(<[MasterItem]>::to_vec)
        .unwrap_or_default()
}

async fn add(
    state: &AppState,
    kind: MasterKind,
    name: &str,
) -> ApiResult<(StatusCode, Json<MasterItem>)> {
    let item = state.master.add_item(kind, name).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// GET /api/clients
pub async fn list_clients(State(state): State<AppState>) -> Json<Vec<MasterItem>> {
    Json(current_items(&state, MasterKind::Clients))
}

/// POST /api/clients (quick add, any role)
pub async fn add_client(
    State(state): State<AppState>,
    Json(request): Json<NameRequest>,
) -> ApiResult<(StatusCode, Json<MasterItem>)> {
    add(&state, MasterKind::Clients, &request.name).await
}

/// PUT /api/clients/:id (admin)
pub async fn rename_client(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<Uuid>,
    Json(request): Json<NameRequest>,
) -> ApiResult<StatusCode> {
    state
        .master
        .rename_item(&session, MasterKind::Clients, id, &request.name)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/clients/:id (admin)
pub async fn delete_client(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.master.delete_item(&session, MasterKind::Clients, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/products
pub async fn list_products(State(state): State<AppState>) -> Json<Vec<MasterItem>> {
    Json(current_items(&state, MasterKind::Products))
}

/// POST /api/products (quick add, any role)
pub async fn add_product(
    State(state): State<AppState>,
    Json(request): Json<NameRequest>,
) -> ApiResult<(StatusCode, Json<MasterItem>)> {
    add(&state, MasterKind::Products, &request.name).await
}

/// PUT /api/products/:id (admin)
pub async fn rename_product(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<Uuid>,
    Json(request): Json<NameRequest>,
) -> ApiResult<StatusCode> {
    state
        .master
        .rename_item(&session, MasterKind::Products, id, &request.name)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/products/:id (admin)
pub async fn delete_product(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.master.delete_item(&session, MasterKind::Products, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/users (admin); passwords are never serialized
pub async fn list_users(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> ApiResult<Json<Vec<User>>> {
    session.require_admin()?;
    let snapshot = state.fanout.current(Collection::Users);
    Ok(Json(snapshot.users().map(<[User]>::to_vec).unwrap_or_default()))
}

/// POST /api/users (admin)
pub async fn create_user(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(new_user): Json<NewUser>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let user = state.master.create_user(&session, &new_user).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// DELETE /api/users/:id (admin; "admin" is protected)
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.master.delete_user(&session, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
