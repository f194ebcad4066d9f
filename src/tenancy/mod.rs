pub mod naming;
pub mod resolver;
pub mod slug;

pub use naming::{sanitize_store_name, NamingError, StoreName, StoreNaming};
pub use resolver::{resolve, HostPattern, HostRule, ResolverPolicy};
pub use slug::{SlugError, TenantSlug, DEV_SLUG};

/// Request header carrying the resolved tenant slug to downstream handlers
pub const TENANT_SLUG_HEADER: &str = "x-tenant-slug";
