pub mod catalog;
pub mod directory;
pub mod models;
pub mod registry;

pub use catalog::{CatalogError, PgStoreCatalog, StoreCatalog};
pub use directory::{PgTenantDirectory, TenantDirectory};
pub use models::tenant::TenantEntry;
pub use registry::{health_check, ConnectionRegistry, Connector, DatabaseError, PgConnector};

/// True when the error is a database error carrying the given SQLSTATE
pub(crate) fn is_sqlstate(err: &sqlx::Error, code: &str) -> bool {
    match err {
        sqlx::Error::Database(db) => db.code().as_deref() == Some(code),
        _ => false,
    }
}
