// handlers/public/health.rs - GET / and GET /health

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::database::health_check;

pub async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Omnia API",
            "version": version,
            "description": "Tenant routing service: host-based tenant resolution and per-tenant databases",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "signup": "/auth/signup (public - tenant self-service signup)",
                "tenant": "/api/tenant[/health] (tenant resolved from Host)",
            }
        }
    }))
}

/// Liveness plus master store connectivity
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();
    let cached_pools = state.registry.len().await;

    match health_check(&state.master).await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok",
                    "tenant_pools": cached_pools
                }
            })),
        ),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "data": {
                        "status": "degraded",
                        "timestamp": now,
                        "tenant_pools": cached_pools
                    }
                })),
            )
        }
    }
}
