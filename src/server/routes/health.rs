use axum::Json;
use chrono::Utc;
use serde_json::{json, Value};

/// GET /api/health
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "message": "gaokao-advisor is running",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}
