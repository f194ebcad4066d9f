use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::is_sqlstate;
use super::models::tenant::TenantEntry;
use super::registry::DatabaseError;
use crate::tenancy::TenantSlug;

/// SQLSTATE for unique constraint violations
const UNIQUE_VIOLATION: &str = "23505";

/// Master registry of known tenants
#[async_trait]
pub trait TenantDirectory: Send + Sync {
    async fn find(&self, slug: &TenantSlug) -> Result<Option<TenantEntry>, DatabaseError>;

    /// Fails with [`DatabaseError::Conflict`] when the slug is taken
    async fn register(&self, slug: &TenantSlug, display_name: &str) -> Result<TenantEntry, DatabaseError>;

    async fn list(&self) -> Result<Vec<TenantEntry>, DatabaseError>;

    async fn set_active(&self, slug: &TenantSlug, active: bool) -> Result<TenantEntry, DatabaseError>;
}

pub struct PgTenantDirectory {
    pool: PgPool,
}

impl PgTenantDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the `tenants` table if missing
    pub async fn bootstrap(&self) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS tenants (
                id UUID PRIMARY KEY,
                slug TEXT NOT NULL UNIQUE,
                display_name TEXT NOT NULL,
                is_active BOOLEAN NOT NULL DEFAULT true,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        info!("Master tenant registry ready");
        Ok(())
    }
}

#[async_trait]
impl TenantDirectory for PgTenantDirectory {
    async fn find(&self, slug: &TenantSlug) -> Result<Option<TenantEntry>, DatabaseError> {
        let entry = sqlx::query_as::<_, TenantEntry>(
            "SELECT id, slug, display_name, is_active, created_at
             FROM tenants
             WHERE slug = $1",
        )
        .bind(slug.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(entry)
    }

    async fn register(&self, slug: &TenantSlug, display_name: &str) -> Result<TenantEntry, DatabaseError> {
        let result = sqlx::query_as::<_, TenantEntry>(
            "INSERT INTO tenants (id, slug, display_name, is_active)
             VALUES ($1, $2, $3, true)
             RETURNING id, slug, display_name, is_active, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(slug.as_str())
        .bind(display_name)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(entry) => Ok(entry),
            Err(e) if is_sqlstate(&e, UNIQUE_VIOLATION) => {
                Err(DatabaseError::Conflict(format!("Tenant '{}' already exists", slug)))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn list(&self) -> Result<Vec<TenantEntry>, DatabaseError> {
        let entries = sqlx::query_as::<_, TenantEntry>(
            "SELECT id, slug, display_name, is_active, created_at
             FROM tenants
             ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    async fn set_active(&self, slug: &TenantSlug, active: bool) -> Result<TenantEntry, DatabaseError> {
        sqlx::query_as::<_, TenantEntry>(
            "UPDATE tenants SET is_active = $2
             WHERE slug = $1
             RETURNING id, slug, display_name, is_active, created_at",
        )
        .bind(slug.as_str())
        .bind(active)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound(format!("Tenant '{}'", slug)))
    }
}
