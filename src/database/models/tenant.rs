use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Row of the master store's `tenants` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct TenantEntry {
    pub id: Uuid,
    pub slug: String,
    pub display_name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}
