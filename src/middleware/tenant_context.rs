use axum::{
    extract::{Request, State},
    http::{header, HeaderValue},
    middleware::Next,
    response::Response,
};
use serde::Serialize;
use sqlx::PgPool;

use crate::app::AppState;
use crate::database::TenantEntry;
use crate::error::ApiError;
use crate::tenancy::{StoreName, TenantSlug, TENANT_SLUG_HEADER};

/// Tenant database pool, injected by middleware
#[derive(Clone)]
pub struct TenantPool(pub PgPool);

/// Tenant resolved for the current request
#[derive(Clone, Debug, Serialize)]
pub struct TenantContext {
    pub slug: TenantSlug,
    pub store: StoreName,
    /// Master registry entry; `None` for the development tenant
    pub entry: Option<TenantEntry>,
}

/// Resolves the tenant from the `Host` header, checks it against the master
/// registry and hands its pool to downstream handlers.
///
/// Reserved aliases (the development tenant) use the default store and skip
/// the registry lookup.
pub async fn tenant_context_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let host = request
        .headers()
        .get(header::HOST)
        .and_then(|value| value.to_str().ok());
    let slug = state.resolver.resolve(host);

    tracing::debug!(host = ?host, tenant = %slug, "Resolved tenant");

    let entry = if state.registry.naming().is_default_alias(&slug) {
        None
    } else {
        let entry = state.directory.find(&slug).await?.ok_or_else(|| {
            tracing::warn!("Tenant '{}' not found in master registry", slug);
            ApiError::not_found(format!("Tenant '{}' does not exist", slug))
        })?;

        if !entry.is_active {
            tracing::warn!("Tenant '{}' is inactive", slug);
            return Err(ApiError::forbidden(format!("Tenant '{}' is not active", slug)));
        }
        Some(entry)
    };

    let pool = state.registry.get(&slug).await?;
    let store = state.registry.store_name(&slug)?;

    // Overwrites any client-supplied value
    let slug_header = HeaderValue::from_str(slug.as_str())
        .map_err(|_| ApiError::internal_server_error("Failed to propagate tenant"))?;
    request.headers_mut().insert(TENANT_SLUG_HEADER, slug_header);

    request.extensions_mut().insert(TenantContext { slug, store, entry });
    request.extensions_mut().insert(TenantPool(pool));

    Ok(next.run(request).await)
}
