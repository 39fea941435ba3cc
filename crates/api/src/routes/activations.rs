//! Activation endpoints: listing, lookup and seat release.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use domain::models::activation::{
    ActivationResponse, BulkDeactivateRequest, DeactivateRequest, ListActivationsQuery,
};
use domain::models::Activation;
use domain::services::BulkDeactivateReport;
use persistence::repositories::{ActivationFilter, ActivationRepository};
use shared::pagination::{PageRequest, Paginated};
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::ValidJson;
use crate::services::SeatService;

/// List activations across licenses.
///
/// GET /api/v1/activations?license_id=&is_active=&instance_identifier=&page=&per_page=
pub async fn list_activations(
    State(state): State<AppState>,
    Query(query): Query<ListActivationsQuery>,
    Query(page): Query<PageRequest>,
) -> Result<Json<Paginated<ActivationResponse>>, ApiError> {
    let filter = ActivationFilter {
        license_id: query.license_id,
        is_active: query.is_active,
        instance_identifier: query
            .instance_identifier
            .map(|instance| instance.trim().to_string()),
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

/// GET /api/v1/activations/:activation_id
pub async fn get_activation(
    State(state): State<AppState>,
    Path(activation_id): Path<Uuid>,
) -> Result<Json<ActivationResponse>, ApiError> {
    let entity = ActivationRepository::new(state.pool.clone())
        .find_by_id(activation_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Activation not found".to_string()))?;

    Ok(Json(Activation::from(entity).into()))
}

/// Release the seat held by an activation. The body is optional.
///
/// POST /api/v1/activations/:activation_id/deactivate
pub async fn deactivate_activation(
    State(state): State<AppState>,
    Path(activation_id): Path<Uuid>,
    body: Option<Json<DeactivateRequest>>,
) -> Result<Json<ActivationResponse>, ApiError> {
    let request = body.map(|Json(request)| request).unwrap_or_default();
    request.validate()?;

    let activation = SeatService::new(state.pool.clone())
        .deactivate(activation_id, request.reason)
        .await?;
    Ok(Json(activation))
}

/// Release several seats. Each id is handled on its own and reported.
///
/// POST /api/v1/activations/bulk_deactivate
pub async fn bulk_deactivate(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<BulkDeactivateRequest>,
) -> Result<Json<BulkDeactivateReport>, ApiError> {
    let report = SeatService::new(state.pool.clone())
        .bulk_deactivate(&request.activation_ids, request.reason)
        .await?;
    Ok(Json(report))
}
