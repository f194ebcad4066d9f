// handlers/mod.rs - HTTP handlers grouped by tenant scope
//
// Public (no tenant context) → Tenant (resolved from Host, behind tenant_context_middleware)
pub mod public; // /, /health, /auth/signup
pub mod tenant; // /api/tenant/*
