use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, TenantScope};
use crate::settings::{SettingsPatchRequest, UserSettings};

/// GET /settings - Current user's settings, materializing defaults on first access
pub async fn get(State(state): State<AppState>, Extension(scope): Extension<TenantScope>) -> ApiResult<UserSettings> {
    let settings = state.settings.get_or_create(scope.user_id).await?;
    Ok(ApiResponse::success(settings))
}

/// PUT /settings - Partial update; omitted fields keep their stored value
pub async fn put(
    State(state): State<AppState>,
    Extension(scope): Extension<TenantScope>,
    payload: Result<Json<SettingsPatchRequest>, JsonRejection>,
) -> ApiResult<UserSettings> {
    let Json(request) = payload?;

    let patch = request.validate().map_err(|field_errors| {
        tracing::debug!("Rejected settings update for user {}: {:?}", scope.user_id, field_errors);
        ApiError::validation_error("Invalid settings", Some(field_errors))
    })?;

    let settings = state.settings.apply(scope.user_id, &patch).await?;
    tracing::info!("Updated settings for user {} (tenant {})", scope.user_id, scope.tenant_id);
    Ok(ApiResponse::success(settings))
}
