//! Integration tests for inward-gate API endpoints
//!
//! Tests cover:
//! - Health endpoint (no session required)
//! - Login, logout and the session middleware
//! - Entry submission, listing, filtering and CSV export
//! - QC transitions under both policies
//! - Master data role gates and the protected admin user
//! - Mirror failure isolation

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use inward_common::config::QcPolicy;
use inward_gate::services::{seed_on_first_snapshot, HttpMirror, MirrorSink};
use inward_gate::{build_router, db, AppState};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot` method

/// Test helper: fresh seeded database and router
async fn setup_app(policy: QcPolicy, mirror: Option<Arc<dyn MirrorSink>>) -> (TempDir, Router) {
    let dir = TempDir::new().expect("Should create temp dir");
    let pool = db::init_database(&dir.path().join("inward-register.db"))
        .await
        .expect("Should init database");

    let state = AppState::new(pool.clone(), 64, 128, policy, mirror)
        .await
        .expect("Should build state");
    seed_on_first_snapshot(&pool, &state.fanout)
        .await
        .expect("Should seed defaults");

    (dir, build_router(state))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Should read body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("Should parse JSON")
    };
    (status, body)
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

async fn login(app: &Router, username: &str, password: &str) -> String {
    let (status, body) = send(
        app,
        json_request(
            "POST",
            "/api/login",
            None,
            json!({"username": username, "password": password}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {}", body);
    body["token"].as_str().unwrap().to_string()
}

fn spice_traders_draft() -> Value {
    json!({
        "vehicleNo": "GJ01AB1234",
        "clientName": "Spice Traders Inc",
        "productName": "Turmeric",
        "bags": "10",
        "bagWeight": "50",
        "transportMode": "Porter",
        "signature": "data:image/png;base64,AAAA"
    })
}

async fn create_entry(app: &Router, token: &str, draft: Value) -> (StatusCode, Value) {
    send(app, json_request("POST", "/api/entries", Some(token), draft)).await
}

// =============================================================================
// Health and sessions
// =============================================================================

#[tokio::test]
async fn test_health_endpoint_no_auth_required() {
    let (_dir, app) = setup_app(QcPolicy::AnyRole, None).await;

    let (status, body) = send(&app, get_request("/health", None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "inward-gate");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_protected_routes_require_session() {
    let (_dir, app) = setup_app(QcPolicy::AnyRole, None).await;

    let (status, body) = send(&app, get_request("/api/entries", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    let (status, _) = send(
        &app,
        get_request("/api/entries", Some("00000000-0000-0000-0000-000000000000")),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_rejects_wrong_password() {
    let (_dir, app) = setup_app(QcPolicy::AnyRole, None).await;

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/login",
            None,
            json!({"username": "admin", "password": "nope"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_login_reports_role_and_logout_ends_session() {
    let (_dir, app) = setup_app(QcPolicy::AnyRole, None).await;

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/login",
            None,
            json!({"username": "staff", "password": "123"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "staff");
    assert_eq!(body["name"], "Gate Staff");
    let token = body["token"].as_str().unwrap().to_string();

    // Query-string token is accepted (EventSource clients)
    let (status, _) = send(&app, get_request(&format!("/api/settings?token={}", token), None)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, json_request("POST", "/api/logout", Some(&token), json!({}))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, get_request("/api/entries", Some(&token))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// =============================================================================
// Entries
// =============================================================================

#[tokio::test]
async fn test_create_and_list_entry() {
    let (_dir, app) = setup_app(QcPolicy::AnyRole, None).await;
    let token = login(&app, "staff", "123").await;

    let (status, body) = create_entry(&app, &token, spice_traders_draft()).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Entry saved");
    assert_eq!(body["mirrorStatus"], "skipped");
    assert!(body["entryCode"].as_str().unwrap().starts_with("IN-"));
    let id = body["id"].as_str().unwrap().to_string();

    let (status, body) = send(&app, get_request("/api/entries", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    let entries = body.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["id"], id.as_str());
    assert_eq!(entries[0]["totalWeight"], 500.0);
    assert_eq!(entries[0]["qcStatus"], "Pending");
    assert_eq!(entries[0]["createdBy"], "Gate Staff");
    assert_eq!(entries[0]["transportMode"], "Porter");
}

#[tokio::test]
async fn test_new_entry_always_starts_pending() {
    let (_dir, app) = setup_app(QcPolicy::AdminOnly, None).await;
    let token = login(&app, "staff", "123").await;

    let mut draft = spice_traders_draft();
    draft["qcStatus"] = json!("Approved");
    let (status, _) = create_entry(&app, &token, draft).await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) = send(&app, get_request("/api/entries", Some(&token))).await;
    assert_eq!(body[0]["qcStatus"], "Pending");
}

#[tokio::test]
async fn test_newest_entry_listed_first() {
    let (_dir, app) = setup_app(QcPolicy::AnyRole, None).await;
    let token = login(&app, "staff", "123").await;

    create_entry(&app, &token, spice_traders_draft()).await;
    let mut second = spice_traders_draft();
    second["vehicleNo"] = json!("MH12XY9090");
    create_entry(&app, &token, second).await;

    let (_, body) = send(&app, get_request("/api/entries", Some(&token))).await;
    let vehicles: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["vehicleNo"].as_str().unwrap())
        .collect();
    assert_eq!(vehicles, vec!["MH12XY9090", "GJ01AB1234"]);
}

#[tokio::test]
async fn test_missing_required_field_is_bad_request() {
    let (_dir, app) = setup_app(QcPolicy::AnyRole, None).await;
    let token = login(&app, "staff", "123").await;

    let mut draft = spice_traders_draft();
    draft["clientName"] = json!("");
    let (status, body) = create_entry(&app, &token, draft).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");

    let (_, body) = send(&app, get_request("/api/entries", Some(&token))).await;
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_list_filters_by_search_and_date() {
    let (_dir, app) = setup_app(QcPolicy::AnyRole, None).await;
    let token = login(&app, "staff", "123").await;

    create_entry(&app, &token, spice_traders_draft()).await;
    let mut other = spice_traders_draft();
    other["vehicleNo"] = json!("MH12XY9090");
    other["clientName"] = json!("Farm Fresh Co");
    create_entry(&app, &token, other).await;

    let (_, body) = send(&app, get_request("/api/entries?search=SPICE", Some(&token))).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (_, body) = send(&app, get_request("/api/entries?search=mh12", Some(&token))).await;
    assert_eq!(body[0]["clientName"], "Farm Fresh Co");

    let (_, body) = send(&app, get_request("/api/entries?date=1999-01-01", Some(&token))).await;
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_export_csv() {
    let (_dir, app) = setup_app(QcPolicy::AnyRole, None).await;
    let token = login(&app, "staff", "123").await;
    create_entry(&app, &token, spice_traders_draft()).await;

    let response = app
        .clone()
        .oneshot(get_request("/api/entries/export", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/csv"));
    let disposition = response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.contains("Register_"));
    assert!(disposition.contains(".csv"));

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[1].contains("\"Spice Traders Inc\""));
    assert!(lines[1].contains(",500,"));
}

#[tokio::test]
async fn test_calc_total() {
    let (_dir, app) = setup_app(QcPolicy::AnyRole, None).await;
    let token = login(&app, "staff", "123").await;

    let (status, body) = send(
        &app,
        json_request("POST", "/api/calc/total", Some(&token), json!({"bags": 10, "bagWeight": "50"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalWeight"], 500.0);

    let (_, body) = send(
        &app,
        json_request("POST", "/api/calc/total", Some(&token), json!({"bags": "10", "bagWeight": "abc"})),
    )
    .await;
    assert_eq!(body["totalWeight"], 0.0);
}

// =============================================================================
// QC
// =============================================================================

#[tokio::test]
async fn test_qc_last_write_wins() {
    let (_dir, app) = setup_app(QcPolicy::AnyRole, None).await;
    let token = login(&app, "staff", "123").await;
    let (_, body) = create_entry(&app, &token, spice_traders_draft()).await;
    let id = body["id"].as_str().unwrap().to_string();
    let uri = format!("/api/entries/{}/status", id);

    let (status, body) = send(&app, json_request("PUT", &uri, Some(&token), json!({"status": "Approved"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["oldStatus"], "Pending");

    let (status, body) = send(&app, json_request("PUT", &uri, Some(&token), json!({"status": "Rejected"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["oldStatus"], "Approved");

    let (_, body) = send(&app, get_request("/api/entries", Some(&token))).await;
    assert_eq!(body[0]["qcStatus"], "Rejected");
    assert_eq!(body[0]["totalWeight"], 500.0);
}

#[tokio::test]
async fn test_qc_reset_to_pending_rejected() {
    let (_dir, app) = setup_app(QcPolicy::AnyRole, None).await;
    let token = login(&app, "admin", "123").await;
    let (_, body) = create_entry(&app, &token, spice_traders_draft()).await;
    let uri = format!("/api/entries/{}/status", body["id"].as_str().unwrap());

    let (status, _) = send(&app, json_request("PUT", &uri, Some(&token), json!({"status": "Pending"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_qc_unknown_entry_not_found() {
    let (_dir, app) = setup_app(QcPolicy::AnyRole, None).await;
    let token = login(&app, "admin", "123").await;

    let uri = format!("/api/entries/{}/status", uuid::Uuid::new_v4());
    let (status, body) = send(&app, json_request("PUT", &uri, Some(&token), json!({"status": "Approved"}))).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_admin_only_qc_policy() {
    let (_dir, app) = setup_app(QcPolicy::AdminOnly, None).await;
    let staff = login(&app, "staff", "123").await;
    let admin = login(&app, "admin", "123").await;
    let (_, body) = create_entry(&app, &staff, spice_traders_draft()).await;
    let uri = format!("/api/entries/{}/status", body["id"].as_str().unwrap());

    let (status, _) = send(&app, json_request("PUT", &uri, Some(&staff), json!({"status": "Approved"}))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, json_request("PUT", &uri, Some(&admin), json!({"status": "Approved"}))).await;
    assert_eq!(status, StatusCode::OK);
}

// =============================================================================
// Master data and users
// =============================================================================

#[tokio::test]
async fn test_seeded_master_data_listed_by_name() {
    let (_dir, app) = setup_app(QcPolicy::AnyRole, None).await;
    let token = login(&app, "staff", "123").await;

    let (_, body) = send(&app, get_request("/api/clients", Some(&token))).await;
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Farm Fresh Co", "Global Foods Ltd", "Spice Traders Inc"]);

    let (_, body) = send(&app, get_request("/api/products", Some(&token))).await;
    assert_eq!(body.as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_staff_quick_add_but_no_rename_or_delete() {
    let (_dir, app) = setup_app(QcPolicy::AnyRole, None).await;
    let staff = login(&app, "staff", "123").await;
    let admin = login(&app, "admin", "123").await;

    let (status, body) = send(
        &app,
        json_request("POST", "/api/clients", Some(&staff), json!({"name": "Hill Estates"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let uri = format!("/api/clients/{}", body["id"].as_str().unwrap());

    let (status, _) = send(&app, json_request("PUT", &uri, Some(&staff), json!({"name": "Hill"}))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = send(&app, json_request("DELETE", &uri, Some(&staff), json!({}))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, json_request("PUT", &uri, Some(&admin), json!({"name": "Hill Estates Pvt"}))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, json_request("DELETE", &uri, Some(&admin), json!({}))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_deleting_client_keeps_entry_name() {
    let (_dir, app) = setup_app(QcPolicy::AnyRole, None).await;
    let admin = login(&app, "admin", "123").await;
    create_entry(&app, &admin, spice_traders_draft()).await;

    let (_, clients) = send(&app, get_request("/api/clients", Some(&admin))).await;
    let spice = clients
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["name"] == "Spice Traders Inc")
        .unwrap();
    let uri = format!("/api/clients/{}", spice["id"].as_str().unwrap());
    let (status, _) = send(&app, json_request("DELETE", &uri, Some(&admin), json!({}))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = send(&app, get_request("/api/entries", Some(&admin))).await;
    assert_eq!(body[0]["clientName"], "Spice Traders Inc");
}

#[tokio::test]
async fn test_admin_user_cannot_be_deleted() {
    let (_dir, app) = setup_app(QcPolicy::AnyRole, None).await;
    let admin = login(&app, "admin", "123").await;

    let (status, users) = send(&app, get_request("/api/users", Some(&admin))).await;
    assert_eq!(status, StatusCode::OK);
    for user in users.as_array().unwrap() {
        assert!(user.get("password").is_none());
    }
    let admin_user = users
        .as_array()
        .unwrap()
        .iter()
        .find(|u| u["username"] == "admin")
        .unwrap();

    let uri = format!("/api/users/{}", admin_user["id"].as_str().unwrap());
    let (status, body) = send(&app, json_request("DELETE", &uri, Some(&admin), json!({}))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "FORBIDDEN");
}

#[tokio::test]
async fn test_user_management_is_admin_only() {
    let (_dir, app) = setup_app(QcPolicy::AnyRole, None).await;
    let staff = login(&app, "staff", "123").await;
    let admin = login(&app, "admin", "123").await;

    let (status, _) = send(&app, get_request("/api/users", Some(&staff))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let new_user = json!({"username": "night", "password": "pw", "role": "staff", "name": "Night Clerk"});
    let (status, _) = send(&app, json_request("POST", "/api/users", Some(&staff), new_user.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, json_request("POST", "/api/users", Some(&admin), new_user.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body.get("password").is_none());

    let (status, _) = send(&app, json_request("POST", "/api/users", Some(&admin), new_user)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    login(&app, "night", "pw").await;
}

#[tokio::test]
async fn test_logo_settings() {
    let (_dir, app) = setup_app(QcPolicy::AnyRole, None).await;
    let staff = login(&app, "staff", "123").await;
    let admin = login(&app, "admin", "123").await;
    let logo = json!({"logo": "data:image/png;base64,AAAA"});

    let (status, _) = send(&app, json_request("PUT", "/api/settings", Some(&staff), logo.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, json_request("PUT", "/api/settings", Some(&admin), logo)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = send(&app, get_request("/api/settings", Some(&staff))).await;
    assert_eq!(body["logo"], "data:image/png;base64,AAAA");
}

// =============================================================================
// Mirror
// =============================================================================

#[tokio::test]
async fn test_unreachable_mirror_does_not_block_save() {
    // Nothing listens on port 9; the export fails with a network error
    let mirror: Arc<dyn MirrorSink> = Arc::new(
        HttpMirror::new("http://127.0.0.1:9/exec".to_string(), Duration::from_millis(500))
            .expect("Should build mirror client"),
    );
    let (_dir, app) = setup_app(QcPolicy::AnyRole, Some(mirror)).await;
    let token = login(&app, "staff", "123").await;

    let (status, body) = create_entry(&app, &token, spice_traders_draft()).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Entry saved");
    let id = body["id"].as_str().unwrap().to_string();

    let (_, entries) = send(&app, get_request("/api/entries", Some(&token))).await;
    assert_eq!(entries[0]["id"], id.as_str());

    let sync_uri = format!("/api/entries/{}/sync", id);
    let mut last = Value::Null;
    for _ in 0..50 {
        let (status, body) = send(&app, get_request(&sync_uri, Some(&token))).await;
        assert_eq!(status, StatusCode::OK);
        last = body["status"].clone();
        if last == "error" {
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert_eq!(last, "error");
}
