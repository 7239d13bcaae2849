use axum::{extract::Request, http::HeaderMap, middleware::Next, response::Response};
use uuid::Uuid;

use super::auth::AuthUser;
use crate::error::ApiError;

/// Optional header a client may send to assert which business it is acting for
pub const TENANT_HEADER: &str = "x-tenant-id";

/// The only owner key protected handlers may query with.
///
/// Built from the verified token, never from the path, query string or body.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TenantScope {
    pub tenant_id: Uuid,
    pub user_id: Uuid,
}

/// Middleware that pins the request to the authenticated user's data.
/// Must run after `jwt_auth_middleware`.
pub async fn data_isolation_middleware(mut request: Request, next: Next) -> Result<Response, ApiError> {
    let auth_user = request
        .extensions()
        .get::<AuthUser>()
        .cloned()
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    if let Some(claimed) = claimed_tenant(request.headers())? {
        if claimed != auth_user.tenant_id {
            tracing::warn!(
                "User {} asked for tenant {} but belongs to {}",
                auth_user.user_id,
                claimed,
                auth_user.tenant_id
            );
            return Err(ApiError::forbidden("Access to another tenant's data is not allowed"));
        }
    }

    request.extensions_mut().insert(TenantScope {
        tenant_id: auth_user.tenant_id,
        user_id: auth_user.user_id,
    });

    Ok(next.run(request).await)
}

fn claimed_tenant(headers: &HeaderMap) -> Result<Option<Uuid>, ApiError> {
    let Some(value) = headers.get(TENANT_HEADER) else {
        return Ok(None);
    };
    value
        .to_str()
        .ok()
        .and_then(|s| Uuid::parse_str(s.trim()).ok())
        .map(Some)
        .ok_or_else(|| ApiError::bad_request("X-Tenant-Id header must be a UUID"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn absent_header_is_fine() {
        assert_eq!(claimed_tenant(&HeaderMap::new()).unwrap(), None);
    }

    #[test]
    fn parses_tenant_header() {
        let id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(TENANT_HEADER, HeaderValue::from_str(&id.to_string()).unwrap());
        assert_eq!(claimed_tenant(&headers).unwrap(), Some(id));
    }

    #[test]
    fn malformed_tenant_header_is_bad_request() {
        let mut headers = HeaderMap::new();
        headers.insert(TENANT_HEADER, HeaderValue::from_static("acme-fish"));
        let err = claimed_tenant(&headers).unwrap_err();
        assert_eq!(err.error_code(), "BAD_REQUEST");
    }
}
