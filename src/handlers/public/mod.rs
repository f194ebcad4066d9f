// handlers/public/mod.rs - Handlers that run without a tenant context
//
// Signup creates the tenant, so it cannot depend on one being resolved.

pub mod health; // GET /, GET /health
pub mod signup; // POST /auth/signup

pub use health::{health, root};
pub use signup::signup;
