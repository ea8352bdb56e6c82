use crate::server::AdminState;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// GET /core/v1/routes
pub async fn list_routes(State(state): State<Arc<AdminState>>) -> Json<Value> {
    Json(json!({"objects": state.table.snapshot()}))
}

/// GET /core/v1/routes/{label}
pub async fn get_route(
    State(state): State<Arc<AdminState>>,
    Path(label): Path<String>,
) -> (StatusCode, Json<Value>) {
    match state.table.get(&label) {
        Some(route) => (StatusCode::OK, Json(json!({"objects": route.record()}))),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "Route not found"})),
        ),
    }
}

/// POST /core/v1/routes
///
/// Multipart form with `label`, `domain`, `path`, and `prefix` fields. The
/// prefix is accepted for wire compatibility but always derived from the
/// label on registration.
pub async fn create_route(
    State(state): State<Arc<AdminState>>,
    mut multipart: Multipart,
) -> (StatusCode, Json<Value>) {
    let mut fields: HashMap<String, String> = HashMap::new();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({"error": e.to_string()})),
                );
            }
        };
        let Some(name) = field.name().map(String::from) else {
            continue;
        };
        match field.text().await {
            Ok(value) => {
                fields.insert(name, value);
            }
            Err(e) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({"error": e.to_string()})),
                );
            }
        }
    }

    let (Some(label), Some(domain), Some(path)) = (
        fields.get("label"),
        fields.get("domain"),
        fields.get("path"),
    ) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "label, domain, and path are required"})),
        );
    };

    match state.control.register(label, domain, path).await {
        Ok(_) => (StatusCode::OK, Json(json!({"objects": state.table.snapshot()}))),
        Err(e) => (
            StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            Json(json!({"error": e.to_string()})),
        ),
    }
}
