//! Endpoints called by brand backends and installed products.

use axum::{extract::State, http::StatusCode, Json};
use domain::models::activation::ActivateResponse;
use domain::models::service::{
    ActivateByKeyRequest, CheckStatusRequest, CheckStatusResponse, ProvisionRequest,
    ProvisionResponse,
};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::ValidJson;
use crate::routes::licenses::activation_status;
use crate::services::{EntitlementService, ProvisioningService};

/// Report the active entitlements of a license key.
///
/// POST /api/v1/service/check-status
pub async fn check_status(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<CheckStatusRequest>,
) -> Result<Json<CheckStatusResponse>, ApiError> {
    let response = EntitlementService::new(state.pool.clone())
        .check_status(&request)
        .await?;
    Ok(Json(response))
}

/// Activate an instance using the key value and a product slug.
///
/// POST /api/v1/service/activate
pub async fn activate(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<ActivateByKeyRequest>,
) -> Result<(StatusCode, Json<ActivateResponse>), ApiError> {
    let response = EntitlementService::new(state.pool.clone())
        .activate_by_key(&request)
        .await?;
    Ok((activation_status(&response), Json(response)))
}

/// Issue a license for a customer, creating their key for the brand if needed.
///
/// POST /api/v1/service/provision
pub async fn provision(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<ProvisionRequest>,
) -> Result<(StatusCode, Json<ProvisionResponse>), ApiError> {
    let response = ProvisioningService::new(state.pool.clone())
        .provision(&request)
        .await?;
    Ok((StatusCode::CREATED, Json(response)))
}
