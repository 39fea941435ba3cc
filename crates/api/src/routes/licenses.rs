//! License endpoints: issuance, reads, lifecycle transitions, audit history
//! and per-license activations.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use domain::models::activation::{
    ActivateRequest, ActivateResponse, ActivationResponse, ListActivationsQuery,
};
use domain::models::license::{
    CancelLicenseRequest, CreateLicenseRequest, LicenseResponse, ListLicensesQuery,
    RenewLicenseRequest, SuspendLicenseRequest,
};
use domain::models::license_event::LicenseHistoryResponse;
use domain::models::{Activation, LicenseEvent};
use domain::services::LifecycleCommand;
use persistence::repositories::{
    ActivationFilter, ActivationRepository, LicenseEventRepository, LicenseFilter,
    LicenseRepository,
};
use shared::pagination::{PageRequest, Paginated};
use shared::validation::normalize_email;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{Actor, ValidJson};
use crate::services::{LifecycleService, ProvisioningService, SeatService};

/// 404 unless the license exists.
async fn ensure_license_exists(state: &AppState, license_id: Uuid) -> Result<(), ApiError> {
    LicenseRepository::new(state.pool.clone())
        .find_by_id(license_id)
        .await?
        .map(|_| ())
        .ok_or_else(|| ApiError::NotFound("License not found".to_string()))
}

/// Issue a license for a product under an existing key.
///
/// POST /api/v1/licenses
pub async fn create_license(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<CreateLicenseRequest>,
) -> Result<(StatusCode, Json<LicenseResponse>), ApiError> {
    let license = ProvisioningService::new(state.pool.clone())
        .issue_license(
            request.license_key_id,
            request.product_id,
            request.expiration_date,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(license)))
}

/// List licenses. The status filter matches the effective status.
///
/// GET /api/v1/licenses?status=&product_id=&license_key_id=&brand_id=&customer_email=
pub async fn list_licenses(
    State(state): State<AppState>,
    Query(query): Query<ListLicensesQuery>,
    Query(page): Query<PageRequest>,
) -> Result<Json<Paginated<LicenseResponse>>, ApiError> {
    let filter = LicenseFilter {
        status: query.status.map(Into::into),
        product_id: query.product_id,
        license_key_id: query.license_key_id,
        brand_id: query.brand_id,
        customer_email: query.customer_email.as_deref().map(normalize_email),
    };

    let repo = LicenseRepository::new(state.pool.clone());
    let total = repo.count(&filter).await?;
    let licenses = repo
        .list(&filter, page.limit(), page.offset())
        .await?
        .into_iter()
        .map(|detail| detail.into_response())
        .collect();

    Ok(Json(Paginated::new(licenses, &page, total)))
}

/// Get a license with its effective status and seat usage.
///
/// GET /api/v1/licenses/:license_id
pub async fn get_license(
    State(state): State<AppState>,
    Path(license_id): Path<Uuid>,
) -> Result<Json<LicenseResponse>, ApiError> {
    let detail = LicenseRepository::new(state.pool.clone())
        .find_detail(license_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("License not found".to_string()))?;

    Ok(Json(detail.into_response()))
}

async fn run_transition(
    state: &AppState,
    license_id: Uuid,
    command: LifecycleCommand,
    actor: &Actor,
) -> Result<Json<LicenseResponse>, ApiError> {
    let license = LifecycleService::new(state.pool.clone())
        .transition(license_id, command, actor.as_str())
        .await?;
    Ok(Json(license))
}

/// POST /api/v1/licenses/:license_id/renew
pub async fn renew_license(
    State(state): State<AppState>,
    actor: Actor,
    Path(license_id): Path<Uuid>,
    ValidJson(request): ValidJson<RenewLicenseRequest>,
) -> Result<Json<LicenseResponse>, ApiError> {
    let command = LifecycleCommand::Renew {
        new_expiration: request.new_expiration_date,
        reason: request.reason,
    };
    run_transition(&state, license_id, command, &actor).await
}

/// POST /api/v1/licenses/:license_id/suspend
pub async fn suspend_license(
    State(state): State<AppState>,
    actor: Actor,
    Path(license_id): Path<Uuid>,
    ValidJson(request): ValidJson<SuspendLicenseRequest>,
) -> Result<Json<LicenseResponse>, ApiError> {
    let command = LifecycleCommand::Suspend {
        reason: request.reason,
    };
    run_transition(&state, license_id, command, &actor).await
}

/// POST /api/v1/licenses/:license_id/resume
pub async fn resume_license(
    State(state): State<AppState>,
    actor: Actor,
    Path(license_id): Path<Uuid>,
) -> Result<Json<LicenseResponse>, ApiError> {
    run_transition(&state, license_id, LifecycleCommand::Resume, &actor).await
}

/// POST /api/v1/licenses/:license_id/cancel
pub async fn cancel_license(
    State(state): State<AppState>,
    actor: Actor,
    Path(license_id): Path<Uuid>,
    ValidJson(request): ValidJson<CancelLicenseRequest>,
) -> Result<Json<LicenseResponse>, ApiError> {
    let command = LifecycleCommand::Cancel {
        reason: request.reason,
    };
    run_transition(&state, license_id, command, &actor).await
}

/// Audit trail of every transition applied to the license, oldest first.
///
/// GET /api/v1/licenses/:license_id/history
pub async fn license_history(
    State(state): State<AppState>,
    Path(license_id): Path<Uuid>,
) -> Result<Json<LicenseHistoryResponse>, ApiError> {
    ensure_license_exists(&state, license_id).await?;

    let events = LicenseEventRepository::new(state.pool.clone())
        .list_for_license(license_id)
        .await?
        .into_iter()
        .map(LicenseEvent::from)
        .collect();

    Ok(Json(LicenseHistoryResponse { license_id, events }))
}

/// Activations held on a license.
///
/// GET /api/v1/licenses/:license_id/activations?is_active=&page=&per_page=
pub async fn list_license_activations(
    State(state): State<AppState>,
    Path(license_id): Path<Uuid>,
    Query(query): Query<ListActivationsQuery>,
    Query(page): Query<PageRequest>,
) -> Result<Json<Paginated<ActivationResponse>>, ApiError> {
    ensure_license_exists(&state, license_id).await?;

    let filter = ActivationFilter {
        license_id: Some(license_id),
        is_active: query.is_active,
        instance_identifier: query.instance_identifier,
    };
    let repo = ActivationRepository::new(state.pool.clone());
    let total = repo.count(&filter).await?;
    let activations = repo
        .list(&filter, page.limit(), page.offset())
        .await?
        .into_iter()
        .map(|entity| Activation::from(entity).into())
        .collect();

    Ok(Json(Paginated::new(activations, &page, total)))
}

/// Claim a seat on a license for an instance.
///
/// POST /api/v1/licenses/:license_id/activations
///
/// Returns 201 for a new activation and 200 when an earlier activation of the
/// same instance is switched back on.
pub async fn activate_license(
    State(state): State<AppState>,
    Path(license_id): Path<Uuid>,
    ValidJson(request): ValidJson<ActivateRequest>,
) -> Result<(StatusCode, Json<ActivateResponse>), ApiError> {
    let response = SeatService::new(state.pool.clone())
        .activate(
            license_id,
            &request.instance_identifier,
            &request.instance_type,
        )
        .await?;
    Ok((activation_status(&response), Json(response)))
}

pub(crate) fn activation_status(response: &ActivateResponse) -> StatusCode {
    if response.reactivated {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_activation_status_codes() {
        let mut response = ActivateResponse {
            activation: ActivationResponse {
                id: Uuid::new_v4(),
                license_id: Uuid::new_v4(),
                instance_identifier: "https://example.com".to_string(),
                instance_type: "url".to_string(),
                is_active: true,
                activated_at: Utc::now(),
                deactivated_at: None,
                deactivation_reason: None,
            },
            reactivated: false,
            total_seats: 2,
            available_seats: 1,
        };
        assert_eq!(activation_status(&response), StatusCode::CREATED);
        response.reactivated = true;
        assert_eq!(activation_status(&response), StatusCode::OK);
    }

    #[test]
    fn test_list_query_status_filter() {
        let uri: axum::http::Uri = "/licenses?status=expired".parse().unwrap();
        let Query(query) = Query::<ListLicensesQuery>::try_from_uri(&uri).unwrap();
        assert_eq!(
            query.status,
            Some(domain::models::LicenseStatus::Expired)
        );
    }
}
