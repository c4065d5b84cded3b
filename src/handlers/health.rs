use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use crate::AppState;

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "nutrilog-api",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Ready once the database answers. A missing text-generation key is
/// reported but does not fail readiness; entries and summaries still work.
pub async fn readyz(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let db_ok = sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(&state.db)
        .await
        .is_ok();
    let parser = if state.config.gemini_api_key.is_empty() {
        "not_configured"
    } else {
        "ok"
    };

    let (status, label, database) = if db_ok {
        (StatusCode::OK, "ready", "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "not_ready", "failed")
    };

    (
        status,
        Json(json!({
            "status": label,
            "checks": { "database": database, "parser": parser },
        })),
    )
}
