// handlers/tenant/mod.rs - Tenant-scoped handlers
//
// Every route here sits behind tenant_context_middleware, which injects the
// TenantContext and TenantPool extensions.

use axum::extract::Extension;
use serde_json::{json, Value};

use crate::database::health_check;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, TenantContext, TenantPool};

/// GET /api/tenant - the tenant this request was routed to
pub async fn tenant_show(Extension(tenant): Extension<TenantContext>) -> ApiResult<TenantContext> {
    Ok(ApiResponse::success(tenant))
}

/// GET /api/tenant/health - connectivity of the tenant's own database
pub async fn tenant_health(
    Extension(tenant): Extension<TenantContext>,
    Extension(TenantPool(pool)): Extension<TenantPool>,
) -> ApiResult<Value> {
    health_check(&pool).await.map_err(|e| {
        tracing::warn!("Tenant '{}' database unreachable: {}", tenant.slug, e);
        ApiError::service_unavailable(format!("Database for tenant '{}' is unavailable", tenant.slug))
    })?;

    Ok(ApiResponse::success(json!({
        "tenant": tenant.slug,
        "store": tenant.store,
        "database": "ok"
    })))
}
