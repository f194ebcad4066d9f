use sqlx::{postgres::PgPoolOptions, PgPool};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::info;

use crate::config::{AppConfig, DatabaseConfig};
use crate::tenancy::{NamingError, StoreName, StoreNaming, TenantSlug};

/// Errors from the connection registry and master store access
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error(transparent)]
    Naming(#[from] NamingError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Builds a connection handle for a connection string.
///
/// Must not perform I/O: the registry calls it while holding its write lock.
pub trait Connector: Send + Sync + 'static {
    type Handle: Clone + Send + Sync + 'static;

    fn connect(&self, connection_string: &str) -> Result<Self::Handle, DatabaseError>;
}

/// Lazily connected PostgreSQL pools
#[derive(Debug, Clone)]
pub struct PgConnector {
    max_connections: u32,
    acquire_timeout: Duration,
}

impl PgConnector {
    pub fn new(max_connections: u32, acquire_timeout: Duration) -> Self {
        Self {
            max_connections,
            acquire_timeout,
        }
    }

    pub fn from_config(database: &DatabaseConfig) -> Self {
        Self::new(
            database.max_connections,
            Duration::from_secs(database.connection_timeout),
        )
    }

    /// Pool for the master (control-plane) store
    pub fn master(&self, database: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
        let url = database
            .master_url()
            .ok_or(DatabaseError::ConfigMissing("DATABASE_URL"))?;
        self.connect(url)
    }
}

impl Connector for PgConnector {
    type Handle = PgPool;

    fn connect(&self, connection_string: &str) -> Result<PgPool, DatabaseError> {
        let pool = PgPoolOptions::new()
            .max_connections(self.max_connections)
            .acquire_timeout(self.acquire_timeout)
            .connect_lazy(connection_string)?;
        Ok(pool)
    }
}

/// Process-wide tenant → connection handle cache.
///
/// Owned by the application state and shared by `Arc`. Handles are created on
/// first access and kept until the process exits; there is no eviction.
pub struct ConnectionRegistry<C: Connector = PgConnector> {
    naming: StoreNaming,
    connector: C,
    handles: RwLock<HashMap<TenantSlug, C::Handle>>,
}

impl ConnectionRegistry<PgConnector> {
    /// Fails when `DATABASE_URL` is missing or unusable
    pub fn from_config(config: &AppConfig) -> Result<Self, DatabaseError> {
        if config.database.url.is_none() {
            return Err(DatabaseError::ConfigMissing("DATABASE_URL"));
        }
        let naming = StoreNaming::from_config(&config.database, &config.tenancy)?;
        Ok(Self::new(naming, PgConnector::from_config(&config.database)))
    }
}

impl<C: Connector> ConnectionRegistry<C> {
    pub fn new(naming: StoreNaming, connector: C) -> Self {
        Self {
            naming,
            connector,
            handles: RwLock::new(HashMap::new()),
        }
    }

    pub fn naming(&self) -> &StoreNaming {
        &self.naming
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Get the tenant's handle, creating it on first access
    pub async fn get(&self, tenant: &TenantSlug) -> Result<C::Handle, DatabaseError> {
        // Fast path: try read lock
        {
            let handles = self.handles.read().await;
            if let Some(handle) = handles.get(tenant) {
                return Ok(handle.clone());
            }
        }

        let store = self.naming.store_name(tenant)?;
        let connection_string = self.naming.connection_string(&store);

        let mut handles = self.handles.write().await;
        // Another task may have inserted between the two locks
        if let Some(handle) = handles.get(tenant) {
            return Ok(handle.clone());
        }

        let handle = self.connector.connect(&connection_string)?;
        handles.insert(tenant.clone(), handle.clone());

        info!(tenant = %tenant, store = %store, "Created database pool");
        Ok(handle)
    }

    pub fn store_name(&self, tenant: &TenantSlug) -> Result<StoreName, DatabaseError> {
        Ok(self.naming.store_name(tenant)?)
    }

    pub fn connection_string(&self, tenant: &TenantSlug) -> Result<String, DatabaseError> {
        let store = self.naming.store_name(tenant)?;
        Ok(self.naming.connection_string(&store))
    }

    pub async fn contains(&self, tenant: &TenantSlug) -> bool {
        self.handles.read().await.contains_key(tenant)
    }

    pub async fn len(&self) -> usize {
        self.handles.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.handles.read().await.is_empty()
    }

    /// Tenants with a cached handle, sorted
    pub async fn tenants(&self) -> Vec<TenantSlug> {
        let mut tenants: Vec<TenantSlug> = self.handles.read().await.keys().cloned().collect();
        tenants.sort();
        tenants
    }
}

/// Pings a pool to ensure connectivity
pub async fn health_check(pool: &PgPool) -> Result<(), DatabaseError> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}
