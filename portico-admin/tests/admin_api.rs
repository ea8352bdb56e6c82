//! Integration tests for the management API handlers.
//!
//! Uses `tower::ServiceExt::oneshot` to call handlers without binding a real
//! TCP port — every test gets a fresh in-memory state.

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use portico_admin::{build_admin_router, AdminState};
use portico_core::table::RouteTable;
use portico_store::{ControlPlane, KeyStore, MemoryCache, RoutePublisher};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt; // .oneshot()

const BOUNDARY: &str = "X-PORTICO-TEST-BOUNDARY";

// ── Helpers ───────────────────────────────────────────────────

struct Fixture {
    state: Arc<AdminState>,
    store: MemoryCache,
}

fn make_fixture() -> Fixture {
    let table = Arc::new(RouteTable::new());
    let store = MemoryCache::new();
    // Unbound publish endpoint with a short timeout keeps registration fast.
    let control = Arc::new(ControlPlane::new(
        Arc::clone(&table),
        Arc::new(store.clone()),
        RoutePublisher::new("tcp://127.0.0.1:59672", Duration::from_millis(50)),
    ));
    Fixture {
        state: Arc::new(AdminState { table, control }),
        store,
    }
}

fn get_req(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn multipart_post(uri: &str, fields: &[(&str, &str)]) -> Request<Body> {
    let mut body = String::new();
    for (name, value) in fields {
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        ));
    }
    body.push_str(&format!("--{BOUNDARY}--\r\n"));
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn body_json(resp: axum::response::Response) -> serde_json::Value {
    let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// ── Health ────────────────────────────────────────────────────

#[tokio::test]
async fn health_check_returns_200() {
    let f = make_fixture();
    let app = build_admin_router(f.state);
    let resp = app.oneshot(get_req("/core/v1/health")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

// ── Listing ───────────────────────────────────────────────────

#[tokio::test]
async fn list_routes_empty_table() {
    let f = make_fixture();
    let app = build_admin_router(f.state);
    let resp = app.oneshot(get_req("/core/v1/routes")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()["content-type"]
            .to_str()
            .unwrap(),
        "application/json"
    );
    let j = body_json(resp).await;
    assert_eq!(j["objects"], serde_json::json!({}));
}

// ── Registration ──────────────────────────────────────────────

#[tokio::test]
async fn create_route_registers_and_lists() {
    let f = make_fixture();
    let app = build_admin_router(Arc::clone(&f.state));
    let req = multipart_post(
        "/core/v1/routes",
        &[
            ("label", "foo"),
            ("domain", "api.example"),
            ("path", "http://api.example/foo"),
            ("prefix", "/foo"),
        ],
    );

    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let j = body_json(resp).await;
    assert_eq!(j["objects"]["foo"]["domain"], "api.example");
    assert_eq!(j["objects"]["foo"]["prefix"], "/foo");

    // Registered route is dispatchable and persisted.
    let route = f.state.table.lookup("/foo/users/42").unwrap();
    assert_eq!(route.domain, "api.example");
    let cached = f.store.route_record("foo").await.unwrap().unwrap();
    assert_eq!(cached.path, "http://api.example/foo");
}

#[tokio::test]
async fn create_route_missing_field_is_rejected() {
    let f = make_fixture();
    let app = build_admin_router(Arc::clone(&f.state));
    let req = multipart_post("/core/v1/routes", &[("label", "foo")]);

    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(f.state.table.is_empty());
}

#[tokio::test]
async fn create_route_bad_target_is_rejected() {
    let f = make_fixture();
    let app = build_admin_router(Arc::clone(&f.state));
    let req = multipart_post(
        "/core/v1/routes",
        &[("label", "foo"), ("domain", "api.example"), ("path", "http://")],
    );

    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_route_twice_replaces_registration() {
    let f = make_fixture();

    let app = build_admin_router(Arc::clone(&f.state));
    app.oneshot(multipart_post(
        "/core/v1/routes",
        &[("label", "foo"), ("domain", "a.example"), ("path", "http://a.example/")],
    ))
    .await
    .unwrap();

    let app = build_admin_router(Arc::clone(&f.state));
    let resp = app
        .oneshot(multipart_post(
            "/core/v1/routes",
            &[("label", "foo"), ("domain", "b.example"), ("path", "http://b.example/")],
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let route = f.state.table.lookup("/foo/x").unwrap();
    assert_eq!(route.domain, "b.example");
    assert_eq!(f.state.table.len(), 1);
}

// ── Single route ──────────────────────────────────────────────

#[tokio::test]
async fn get_route_returns_record_after_registration() {
    let f = make_fixture();

    let app = build_admin_router(Arc::clone(&f.state));
    app.oneshot(multipart_post(
        "/core/v1/routes",
        &[("label", "foo"), ("domain", "api.example"), ("path", "http://api.example/foo")],
    ))
    .await
    .unwrap();

    let app = build_admin_router(Arc::clone(&f.state));
    let resp = app.oneshot(get_req("/core/v1/routes/foo")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let j = body_json(resp).await;
    assert_eq!(j["objects"]["label"], "foo");
    assert_eq!(j["objects"]["domain"], "api.example");
}

#[tokio::test]
async fn get_route_returns_404_when_missing() {
    let f = make_fixture();
    let app = build_admin_router(f.state);
    let resp = app
        .oneshot(get_req("/core/v1/routes/nonexistent"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
