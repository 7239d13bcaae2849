pub mod auth;
pub mod isolation;
pub mod rate_limit;
pub mod response;

pub use auth::{jwt_auth_middleware, AuthUser};
pub use isolation::{data_isolation_middleware, TenantScope, TENANT_HEADER};
pub use rate_limit::{rate_limit_middleware, RequestRateLimiter};
pub use response::{ApiResponse, ApiResult};
