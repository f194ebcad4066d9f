use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use tracing::info;

use super::is_sqlstate;
use crate::tenancy::StoreName;

/// SQLSTATE for `CREATE DATABASE` on an existing name
const DUPLICATE_DATABASE: &str = "42P04";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Database {0} already exists")]
    AlreadyExists(StoreName),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Database-level administration on the server hosting the tenant stores
#[async_trait]
pub trait StoreCatalog: Send + Sync {
    async fn exists(&self, store: &StoreName) -> Result<bool, CatalogError>;

    /// Fails with [`CatalogError::AlreadyExists`] when the database is already there
    async fn create(&self, store: &StoreName) -> Result<(), CatalogError>;

    async fn drop_store(&self, store: &StoreName) -> Result<(), CatalogError>;
}

/// Catalog backed by `pg_database`, reached through the master store
#[derive(Clone)]
pub struct PgStoreCatalog {
    master: PgPool,
}

impl PgStoreCatalog {
    pub fn new(master: PgPool) -> Self {
        Self { master }
    }
}

#[async_trait]
impl StoreCatalog for PgStoreCatalog {
    async fn exists(&self, store: &StoreName) -> Result<bool, CatalogError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM pg_database WHERE datname = $1")
            .bind(store.as_str())
            .fetch_one(&self.master)
            .await?;

        Ok(count.0 > 0)
    }

    async fn create(&self, store: &StoreName) -> Result<(), CatalogError> {
        let query = format!("CREATE DATABASE {}", quote_identifier(store));

        match sqlx::query(&query).execute(&self.master).await {
            Ok(_) => {
                info!(store = %store, "Created tenant database");
                Ok(())
            }
            Err(e) if is_sqlstate(&e, DUPLICATE_DATABASE) => Err(CatalogError::AlreadyExists(store.clone())),
            Err(e) => Err(e.into()),
        }
    }

    async fn drop_store(&self, store: &StoreName) -> Result<(), CatalogError> {
        let query = format!("DROP DATABASE IF EXISTS {}", quote_identifier(store));
        sqlx::query(&query).execute(&self.master).await?;
        info!(store = %store, "Dropped tenant database");
        Ok(())
    }
}

/// Quote a sanitized name as an SQL identifier
fn quote_identifier(store: &StoreName) -> String {
    format!("\"{}\"", store.as_str().replace('"', "\"\""))
}
