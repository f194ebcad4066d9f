pub mod response;
pub mod tenant_context;

pub use response::{ApiResponse, ApiResult};
pub use tenant_context::{tenant_context_middleware, TenantContext, TenantPool};
