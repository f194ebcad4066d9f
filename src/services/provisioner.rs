use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::database::{CatalogError, StoreCatalog};
use crate::services::schema_sync::{SchemaSync, SchemaSyncError};
use crate::tenancy::{NamingError, StoreName, StoreNaming, TenantSlug};

#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error(transparent)]
    Naming(#[from] NamingError),

    #[error("Failed to create database {store}: {source}")]
    Create {
        store: StoreName,
        #[source]
        source: CatalogError,
    },

    #[error("Failed to apply schema to {store}: {source}")]
    Schema {
        store: StoreName,
        #[source]
        source: SchemaSyncError,
    },

    #[error("Provisioning {store} timed out after {timeout:?}")]
    Timeout { store: StoreName, timeout: Duration },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProvisionOutcome {
    /// The store was created and the schema applied by this call
    Created,
    /// The store already existed, or a concurrent attempt created it first
    AlreadyProvisioned,
}

/// Creates tenant databases and applies the schema to them, once
pub struct TenantProvisioner {
    naming: StoreNaming,
    catalog: Arc<dyn StoreCatalog>,
    schema: Arc<dyn SchemaSync>,
    timeout: Duration,
}

impl TenantProvisioner {
    pub fn new(
        naming: StoreNaming,
        catalog: Arc<dyn StoreCatalog>,
        schema: Arc<dyn SchemaSync>,
        timeout: Duration,
    ) -> Self {
        Self {
            naming,
            catalog,
            schema,
            timeout,
        }
    }

    pub fn naming(&self) -> &StoreNaming {
        &self.naming
    }

    /// Make sure the tenant's store exists and carries the schema.
    ///
    /// The existence check and the creation are not atomic; a concurrent
    /// attempt that wins the race turns this call into a no-op. Catalog steps
    /// run under the provisioning timeout; the schema tool enforces its own.
    pub async fn ensure(&self, tenant: &TenantSlug) -> Result<ProvisionOutcome, ProvisionError> {
        let store = self.naming.store_name(tenant)?;

        let exists = self
            .bounded(&store, self.catalog.exists(&store))
            .await?
            .map_err(|source| ProvisionError::Create {
                store: store.clone(),
                source,
            })?;
        if exists {
            info!(tenant = %tenant, store = %store, "Tenant database already provisioned");
            return Ok(ProvisionOutcome::AlreadyProvisioned);
        }

        match self.bounded(&store, self.catalog.create(&store)).await? {
            Ok(()) => {}
            Err(CatalogError::AlreadyExists(_)) => {
                warn!(tenant = %tenant, store = %store, "Tenant database created concurrently");
                return Ok(ProvisionOutcome::AlreadyProvisioned);
            }
            Err(source) => {
                error!(tenant = %tenant, store = %store, error = %source, "Failed to create tenant database");
                return Err(ProvisionError::Create { store, source });
            }
        }

        let target = self.naming.connection_string(&store);
        if let Err(source) = self.schema.apply(&target).await {
            error!(tenant = %tenant, store = %store, error = %source, "Schema sync failed");
            // Leave nothing half-provisioned behind so a retry starts clean
            match self.bounded(&store, self.catalog.drop_store(&store)).await {
                Ok(Ok(())) => {}
                Ok(Err(drop_err)) => {
                    error!(store = %store, error = %drop_err, "Failed to drop partially provisioned database");
                }
                Err(timeout) => {
                    error!(store = %store, error = %timeout, "Dropping partially provisioned database timed out");
                }
            }
            return Err(ProvisionError::Schema { store, source });
        }

        info!(tenant = %tenant, store = %store, "Provisioned tenant database");
        Ok(ProvisionOutcome::Created)
    }

    async fn bounded<T>(&self, store: &StoreName, step: impl Future<Output = T>) -> Result<T, ProvisionError> {
        tokio::time::timeout(self.timeout, step).await.map_err(|_| {
            error!(store = %store, "Provisioning timed out");
            ProvisionError::Timeout {
                store: store.clone(),
                timeout: self.timeout,
            }
        })
    }
}
