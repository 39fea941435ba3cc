//! License key registry endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use domain::models::license_key::{
    CreateLicenseKeyRequest, LicenseKeyDetailResponse, LicenseKeyResponse, LicenseKeysByEmailQuery,
    LicenseSeatSummary, ListLicenseKeysQuery, SeatOverrideRequest, UpdateLicenseKeyRequest,
};
use domain::models::product::ProductSummary;
use domain::models::Product;
use persistence::entities::LicenseKeySummaryEntity;
use persistence::repositories::{
    BrandRepository, LicenseKeyFilter, LicenseKeyRepository, LicenseRepository, ProductRepository,
};
use shared::pagination::{PageRequest, Paginated};
use shared::validation::normalize_email;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{Actor, ValidJson};
use crate::services::SeatService;

fn key_response(entity: LicenseKeySummaryEntity) -> LicenseKeyResponse {
    LicenseKeyResponse::new(entity.key.into(), entity.brand_name, entity.license_count)
}

/// Builds the key view with its licenses, products and per-license seat usage.
async fn key_detail(
    pool: &PgPool,
    summary: LicenseKeySummaryEntity,
) -> Result<LicenseKeyDetailResponse, ApiError> {
    let key_id = summary.key.id;
    let products = ProductRepository::new(pool.clone())
        .list_for_license_key(key_id)
        .await?
        .into_iter()
        .map(|entity| ProductSummary::from(&Product::from(entity)))
        .collect();

    let licenses: Vec<_> = LicenseRepository::new(pool.clone())
        .list_for_license_key(key_id)
        .await?
        .into_iter()
        .map(|detail| detail.into_response())
        .collect();

    let seats = licenses
        .iter()
        .map(|license| LicenseSeatSummary {
            license_id: license.id,
            product_slug: license.product.slug.clone(),
            active_seats: license.active_seats,
            available_seats: license.available_seats,
        })
        .collect();

    Ok(LicenseKeyDetailResponse {
        key: key_response(summary),
        products,
        licenses,
        seats,
    })
}

/// Issue a license key for a customer under a brand. The key value is generated.
///
/// POST /api/v1/license-keys
pub async fn create_license_key(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<CreateLicenseKeyRequest>,
) -> Result<(StatusCode, Json<LicenseKeyResponse>), ApiError> {
    let brand = BrandRepository::new(state.pool.clone())
        .find_by_id(request.brand_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Brand not found".to_string()))?;

    let entity = LicenseKeyRepository::new(state.pool.clone())
        .create(
            brand.id,
            &normalize_email(&request.customer_email),
            request.total_seats,
        )
        .await?;

    info!(
        license_key_id = %entity.id,
        brand_id = %brand.id,
        total_seats = entity.total_seats,
        "License key issued"
    );

    Ok((
        StatusCode::CREATED,
        Json(LicenseKeyResponse::new(entity.into(), brand.name, 0)),
    ))
}

/// List license keys.
///
/// GET /api/v1/license-keys?brand_id=&customer_email=&is_active=&page=&per_page=
pub async fn list_license_keys(
    State(state): State<AppState>,
    Query(query): Query<ListLicenseKeysQuery>,
    Query(page): Query<PageRequest>,
) -> Result<Json<Paginated<LicenseKeyResponse>>, ApiError> {
    let filter = LicenseKeyFilter {
        brand_id: query.brand_id,
        customer_email: query.customer_email.as_deref().map(normalize_email),
        is_active: query.is_active,
    };

    let repo = LicenseKeyRepository::new(state.pool.clone());
    let total = repo.count(&filter).await?;
    let keys = repo
        .list(&filter, page.limit(), page.offset())
        .await?
        .into_iter()
        .map(key_response)
        .collect();

    Ok(Json(Paginated::new(keys, &page, total)))
}

/// All keys a customer holds across brands, each with its licenses.
///
/// GET /api/v1/license-keys/by-email?email=
pub async fn license_keys_by_email(
    State(state): State<AppState>,
    Query(query): Query<LicenseKeysByEmailQuery>,
) -> Result<Json<Vec<LicenseKeyDetailResponse>>, ApiError> {
    query.validate()?;

    let summaries = LicenseKeyRepository::new(state.pool.clone())
        .list_by_email(&normalize_email(&query.email))
        .await?;

    let mut keys = Vec::with_capacity(summaries.len());
    for summary in summaries {
        keys.push(key_detail(&state.pool, summary).await?);
    }
    Ok(Json(keys))
}

/// Get a license key with its licenses and seat usage.
///
/// GET /api/v1/license-keys/:license_key_id
pub async fn get_license_key(
    State(state): State<AppState>,
    Path(license_key_id): Path<Uuid>,
) -> Result<Json<LicenseKeyDetailResponse>, ApiError> {
    let summary = LicenseKeyRepository::new(state.pool.clone())
        .find_summary(license_key_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("License key not found".to_string()))?;

    Ok(Json(key_detail(&state.pool, summary).await?))
}

/// Update a key's customer email or active flag.
///
/// PATCH /api/v1/license-keys/:license_key_id
pub async fn update_license_key(
    State(state): State<AppState>,
    Path(license_key_id): Path<Uuid>,
    ValidJson(request): ValidJson<UpdateLicenseKeyRequest>,
) -> Result<Json<LicenseKeyResponse>, ApiError> {
    if request.customer_email.is_none() && request.is_active.is_none() {
        return Err(ApiError::Validation("No fields to update".to_string()));
    }

    let repo = LicenseKeyRepository::new(state.pool.clone());
    let email = request.customer_email.as_deref().map(normalize_email);
    repo.update(license_key_id, email.as_deref(), request.is_active)
        .await?
        .ok_or_else(|| ApiError::NotFound("License key not found".to_string()))?;

    let summary = repo
        .find_summary(license_key_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("License key not found".to_string()))?;

    info!(license_key_id = %license_key_id, is_active = ?request.is_active, "License key updated");
    Ok(Json(key_response(summary)))
}

/// Admin override of a key's seat total.
///
/// PUT /api/v1/license-keys/:license_key_id/seats
pub async fn override_seats(
    State(state): State<AppState>,
    actor: Actor,
    Path(license_key_id): Path<Uuid>,
    ValidJson(request): ValidJson<SeatOverrideRequest>,
) -> Result<Json<LicenseKeyResponse>, ApiError> {
    let response = SeatService::new(state.pool.clone())
        .override_seats(
            license_key_id,
            request.total_seats,
            request.reason.as_deref(),
            actor.as_str(),
        )
        .await?;
    Ok(Json(response))
}
