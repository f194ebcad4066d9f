// handlers/public/signup.rs - POST /auth/signup handler

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::{SignupRequest, SignupResult};

/**
 * POST /auth/signup - Create a tenant with its own database
 *
 * Expected Input:
 * ```json
 * {
 *   "tenant_slug": "acme",        // Required: becomes acme.<domain>
 *   "display_name": "Acme Corp"   // Optional: defaults to the slug
 * }
 * ```
 *
 * Responds 201 with the master registry entry and the provisioned store.
 * 400 for invalid or reserved slugs, 409 when the tenant exists or another
 * signup is still setting it up, 503
 * `PROVISIONING_FAILED` when the database could not be provisioned; nothing
 * is registered in that case and the request can be retried.
 */
pub async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> ApiResult<SignupResult> {
    let Json(request) = payload.map_err(|e| ApiError::invalid_json(e.body_text()))?;

    tracing::info!("Signup requested for tenant '{}'", request.tenant_slug);

    let result = state.tenants.sign_up(request).await?;
    Ok(ApiResponse::created(result))
}
