use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::database::{ConnectionRegistry, DatabaseError, TenantDirectory, TenantEntry};
use crate::services::provisioner::{ProvisionError, ProvisionOutcome, TenantProvisioner};
use crate::tenancy::{SlugError, StoreName, TenantSlug};

#[derive(Debug, Clone, Deserialize)]
pub struct SignupRequest {
    pub tenant_slug: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignupResult {
    pub tenant: TenantEntry,
    pub store: StoreName,
    pub outcome: ProvisionOutcome,
}

#[derive(Debug, thiserror::Error)]
pub enum TenantError {
    #[error("Invalid tenant slug: {0}")]
    InvalidSlug(#[from] SlugError),
    #[error("Tenant slug '{0}' is reserved")]
    Reserved(String),
    #[error("Tenant already exists: {0}")]
    AlreadyExists(String),
    /// Store exists without a master entry: another signup is mid-flight or a
    /// previous attempt left it behind
    #[error("Tenant '{0}' is being provisioned")]
    InProgress(String),
    #[error("Tenant not found: {0}")]
    NotFound(String),
    #[error("Tenant provisioning failed: {0}")]
    Provisioning(#[from] ProvisionError),
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

/// Tenant self-service signup: directory check, provisioning, registration
pub struct TenantService {
    directory: Arc<dyn TenantDirectory>,
    provisioner: Arc<TenantProvisioner>,
    registry: Arc<ConnectionRegistry>,
    reserved: Vec<String>,
}

impl TenantService {
    pub fn new(
        directory: Arc<dyn TenantDirectory>,
        provisioner: Arc<TenantProvisioner>,
        registry: Arc<ConnectionRegistry>,
        reserved: Vec<String>,
    ) -> Self {
        Self {
            directory,
            provisioner,
            registry,
            reserved,
        }
    }

    /// Create a new tenant.
    ///
    /// The master entry is written only after the store is provisioned, and the
    /// registry is warmed only after that, so a failed attempt leaves nothing
    /// behind and can be retried. A store that already exists without a master
    /// entry is never adopted.
    pub async fn sign_up(&self, request: SignupRequest) -> Result<SignupResult, TenantError> {
        let slug = TenantSlug::parse(request.tenant_slug.trim())?;
        if self.is_reserved(&slug) {
            return Err(TenantError::Reserved(slug.to_string()));
        }

        if self.directory.find(&slug).await?.is_some() {
            return Err(TenantError::AlreadyExists(slug.to_string()));
        }

        let outcome = self.provisioner.ensure(&slug).await?;
        if outcome == ProvisionOutcome::AlreadyProvisioned {
            // Only the attempt that created the store may register it
            warn!(tenant = %slug, "Store exists but tenant is not registered; refusing to register");
            return Err(TenantError::InProgress(slug.to_string()));
        }

        let display_name = request
            .display_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(slug.as_str())
            .to_string();

        let tenant = match self.directory.register(&slug, &display_name).await {
            Ok(entry) => entry,
            Err(DatabaseError::Conflict(_)) => {
                warn!(tenant = %slug, "Tenant registered concurrently");
                return Err(TenantError::AlreadyExists(slug.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        self.registry.get(&slug).await?;
        let store = self.registry.store_name(&slug)?;

        info!(tenant = %slug, store = %store, ?outcome, "Tenant signed up");
        Ok(SignupResult {
            tenant,
            store,
            outcome,
        })
    }

    /// Flip a tenant's active flag in the master registry
    pub async fn set_active(&self, slug: &TenantSlug, active: bool) -> Result<TenantEntry, TenantError> {
        match self.directory.set_active(slug, active).await {
            Ok(entry) => Ok(entry),
            Err(DatabaseError::NotFound(_)) => Err(TenantError::NotFound(slug.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn list(&self) -> Result<Vec<TenantEntry>, TenantError> {
        Ok(self.directory.list().await?)
    }

    fn is_reserved(&self, slug: &TenantSlug) -> bool {
        self.registry.naming().is_default_alias(slug) || self.reserved.iter().any(|r| r == slug.as_str())
    }
}
