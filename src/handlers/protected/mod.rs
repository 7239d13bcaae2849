// handlers/protected/mod.rs - Protected handlers (JWT authentication required)
//
// Security Level: JWT Authentication Required
// Middleware: jwt_auth → rate_limit → data_isolation
//
// Handlers read the owner key from `TenantScope` only. Nothing in the path,
// query string or body can select another user's row.

pub mod settings;

pub use settings::get as settings_get;
pub use settings::put as settings_put;
