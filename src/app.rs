use anyhow::Context;
use axum::{
    http::HeaderValue,
    middleware,
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::{AppConfig, SecurityConfig};
use crate::database::{
    ConnectionRegistry, PgStoreCatalog, PgTenantDirectory, StoreCatalog, TenantDirectory,
};
use crate::handlers;
use crate::middleware::tenant_context_middleware;
use crate::services::{CommandSchemaSync, SchemaSync, TenantProvisioner, TenantService};
use crate::tenancy::ResolverPolicy;

/// Composition root shared by every request handler
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ConnectionRegistry>,
    pub directory: Arc<dyn TenantDirectory>,
    pub provisioner: Arc<TenantProvisioner>,
    pub tenants: Arc<TenantService>,
    pub resolver: Arc<ResolverPolicy>,
    pub master: PgPool,
}

impl AppState {
    /// Wire the PostgreSQL-backed collaborators. Pools connect lazily.
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let registry = ConnectionRegistry::from_config(config).context("invalid database configuration")?;
        let master = registry.connector().master(&config.database)?;

        let directory: Arc<dyn TenantDirectory> = Arc::new(PgTenantDirectory::new(master.clone()));
        let catalog: Arc<dyn StoreCatalog> = Arc::new(PgStoreCatalog::new(master.clone()));
        let schema: Arc<dyn SchemaSync> = Arc::new(CommandSchemaSync::from_config(&config.provisioning));

        Self::assemble(config, registry, master, directory, catalog, schema)
    }

    /// Wire explicit collaborators around a registry built from `config`
    pub fn with_collaborators(
        config: &AppConfig,
        directory: Arc<dyn TenantDirectory>,
        catalog: Arc<dyn StoreCatalog>,
        schema: Arc<dyn SchemaSync>,
    ) -> anyhow::Result<Self> {
        let registry = ConnectionRegistry::from_config(config).context("invalid database configuration")?;
        let master = registry.connector().master(&config.database)?;
        Self::assemble(config, registry, master, directory, catalog, schema)
    }

    fn assemble(
        config: &AppConfig,
        registry: ConnectionRegistry,
        master: PgPool,
        directory: Arc<dyn TenantDirectory>,
        catalog: Arc<dyn StoreCatalog>,
        schema: Arc<dyn SchemaSync>,
    ) -> anyhow::Result<Self> {
        let resolver = ResolverPolicy::from_config(&config.tenancy).context("invalid development tenant slug")?;

        let provisioner = Arc::new(TenantProvisioner::new(
            registry.naming().clone(),
            catalog,
            schema,
            Duration::from_secs(config.provisioning.timeout_secs),
        ));

        let registry = Arc::new(registry);
        let reserved = vec![config.tenancy.www_alias.clone(), config.tenancy.dev_slug.clone()];
        let tenants = Arc::new(TenantService::new(
            directory.clone(),
            provisioner.clone(),
            registry.clone(),
            reserved,
        ));

        Ok(Self {
            registry,
            directory,
            provisioner,
            tenants,
            resolver: Arc::new(resolver),
            master,
        })
    }
}

pub fn router(state: AppState, security: &SecurityConfig) -> Router {
    // Tenant-scoped API: every request carries its tenant's pool
    let tenant_routes = Router::new()
        .route("/api/tenant", get(handlers::tenant::tenant_show))
        .route("/api/tenant/health", get(handlers::tenant::tenant_health))
        .route_layer(middleware::from_fn_with_state(state.clone(), tenant_context_middleware));

    Router::new()
        // Public
        .route("/", get(handlers::public::root))
        .route("/health", get(handlers::public::health))
        .route("/auth/signup", post(handlers::public::signup))
        .merge(tenant_routes)
        // Global middleware
        .layer(cors_layer(security))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if !security.enable_cors {
        return CorsLayer::new();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}
