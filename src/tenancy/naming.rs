//! Tenant slug → database name → connection string.
//!
//! `CREATE DATABASE` cannot bind its identifier as a parameter, so every
//! database name that reaches SQL is a [`StoreName`], and the only way to
//! build one is [`sanitize_store_name`].

use serde::Serialize;
use std::fmt;
use thiserror::Error;
use url::Url;

use super::slug::TenantSlug;
use crate::config::{DatabaseConfig, TenancyConfig};

/// PostgreSQL truncates identifiers beyond this many bytes
pub const MAX_STORE_NAME_LEN: usize = 63;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NamingError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error("Database URL must name a default database in its path")]
    MissingDefaultStore,

    #[error("Invalid store name: {0:?}")]
    InvalidStoreName(String),
}

/// Sanitized database name, safe to interpolate into DDL
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct StoreName(String);

impl StoreName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StoreName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Keep ASCII alphanumerics and `_`; reject names that end up empty or longer
/// than PostgreSQL keeps.
pub fn sanitize_store_name(raw: &str) -> Result<StoreName, NamingError> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();

    if cleaned.is_empty() || cleaned.len() > MAX_STORE_NAME_LEN {
        return Err(NamingError::InvalidStoreName(raw.to_string()));
    }
    Ok(StoreName(cleaned))
}

/// Deterministic naming of tenant stores derived from a base connection string
#[derive(Debug, Clone)]
pub struct StoreNaming {
    base_url: Url,
    default_store: StoreName,
    prefix: String,
    default_aliases: Vec<String>,
}

impl StoreNaming {
    pub fn new(base_url: &str, prefix: &str, default_aliases: &[String]) -> Result<Self, NamingError> {
        let base_url = Url::parse(base_url).map_err(|_| NamingError::InvalidDatabaseUrl)?;

        let path = base_url.path().trim_start_matches('/');
        if path.is_empty() {
            return Err(NamingError::MissingDefaultStore);
        }
        let default_store = sanitize_store_name(path)?;
        if default_store.as_str() != path {
            return Err(NamingError::InvalidStoreName(path.to_string()));
        }

        Ok(Self {
            base_url,
            default_store,
            prefix: prefix.to_string(),
            default_aliases: default_aliases.to_vec(),
        })
    }

    pub fn from_config(database: &DatabaseConfig, tenancy: &TenancyConfig) -> Result<Self, NamingError> {
        let url = database
            .url
            .as_deref()
            .ok_or(NamingError::ConfigMissing("DATABASE_URL"))?;
        // The fallback tenant always lands on the default store
        let mut aliases = tenancy.default_aliases.clone();
        if !aliases.contains(&tenancy.dev_slug) {
            aliases.push(tenancy.dev_slug.clone());
        }
        Self::new(url, &tenancy.store_prefix, &aliases)
    }

    pub fn default_store(&self) -> &StoreName {
        &self.default_store
    }

    pub fn is_default_alias(&self, tenant: &TenantSlug) -> bool {
        self.default_aliases.iter().any(|alias| alias == tenant.as_str())
    }

    /// `omnia_tenant_<slug>` (hyphens become underscores), or the default store
    /// for reserved aliases
    pub fn store_name(&self, tenant: &TenantSlug) -> Result<StoreName, NamingError> {
        if self.is_default_alias(tenant) {
            return Ok(self.default_store.clone());
        }
        let raw = format!("{}{}", self.prefix, tenant.as_str().replace('-', "_"));
        sanitize_store_name(&raw)
    }

    /// Base connection string with only the database path swapped
    pub fn connection_string(&self, store: &StoreName) -> String {
        let mut url = self.base_url.clone();
        url.set_path(&format!("/{}", store.as_str()));
        url.into()
    }
}
