use axum::response::Json;
use serde_json::{json, Value};

/// GET /core/v1/health
pub async fn health_check() -> Json<Value> {
    Json(json!({"status": "ok"}))
}
