//! Health & readiness handlers.
//!
//! - GET /health -> liveness, never touches I/O
//! - GET /ready  -> checks PostgreSQL connectivity

use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use crate::http::AppState;

pub async fn health() -> Json<Value> {
    Json(json!({"status": "healthy", "service": "storefront"}))
}

pub async fn ready(State(s): State<AppState>) -> (StatusCode, Json<Value>) {
    match sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(&s.db).await {
        Ok(_) => (StatusCode::OK, Json(json!({"status": "ready", "checks": {"postgres": {"ok": true}}}))),
        Err(e) => {
            tracing::warn!(error = %e, "readiness check failed");
            (StatusCode::SERVICE_UNAVAILABLE, Json(json!({"status": "error", "checks": {"postgres": {"ok": false, "error": e.to_string()}}})))
        }
    }
}
