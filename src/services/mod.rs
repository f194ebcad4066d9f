pub mod provisioner;
pub mod schema_sync;
pub mod tenant_service;

pub use provisioner::{ProvisionError, ProvisionOutcome, TenantProvisioner};
pub use schema_sync::{CommandSchemaSync, SchemaSync, SchemaSyncError, SchemaSyncReport};
pub use tenant_service::{SignupRequest, SignupResult, TenantError, TenantService};
