//! Brand registry endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use domain::models::brand::{BrandResponse, CreateBrandRequest, ListBrandsQuery, UpdateBrandRequest};
use persistence::entities::BrandWithCountEntity;
use persistence::repositories::BrandRepository;
use shared::pagination::{PageRequest, Paginated};
use tracing::info;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::ValidJson;

fn brand_response(entity: BrandWithCountEntity) -> BrandResponse {
    BrandResponse::new(entity.brand.into(), entity.product_count)
}

/// Create a brand.
///
/// POST /api/v1/brands
pub async fn create_brand(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<CreateBrandRequest>,
) -> Result<(StatusCode, Json<BrandResponse>), ApiError> {
    let entity = BrandRepository::new(state.pool.clone())
        .create(
            request.name.trim(),
            &request.slug,
            &request.description,
            request.is_active,
        )
        .await?;

    info!(brand_id = %entity.id, slug = %entity.slug, "Brand created");

    Ok((
        StatusCode::CREATED,
        Json(BrandResponse::new(entity.into(), 0)),
    ))
}

/// List brands.
///
/// GET /api/v1/brands?is_active=&page=&per_page=
pub async fn list_brands(
    State(state): State<AppState>,
    Query(query): Query<ListBrandsQuery>,
    Query(page): Query<PageRequest>,
) -> Result<Json<Paginated<BrandResponse>>, ApiError> {
    let repo = BrandRepository::new(state.pool.clone());
    let total = repo.count(query.is_active).await?;
    let brands = repo
        .list(query.is_active, page.limit(), page.offset())
        .await?
        .into_iter()
        .map(brand_response)
        .collect();

    Ok(Json(Paginated::new(brands, &page, total)))
}

/// Get a brand by ID.
///
/// GET /api/v1/brands/:brand_id
pub async fn get_brand(
    State(state): State<AppState>,
    Path(brand_id): Path<Uuid>,
) -> Result<Json<BrandResponse>, ApiError> {
    let entity = BrandRepository::new(state.pool.clone())
        .find_with_count(brand_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Brand not found".to_string()))?;

    Ok(Json(brand_response(entity)))
}

/// Update a brand. The slug cannot be changed.
///
/// PATCH /api/v1/brands/:brand_id
pub async fn update_brand(
    State(state): State<AppState>,
    Path(brand_id): Path<Uuid>,
    ValidJson(request): ValidJson<UpdateBrandRequest>,
) -> Result<Json<BrandResponse>, ApiError> {
    if request.is_empty() {
        return Err(ApiError::Validation("No fields to update".to_string()));
    }

    let repo = BrandRepository::new(state.pool.clone());
    repo.update(
        brand_id,
        request.name.as_deref().map(str::trim),
        request.description.as_deref(),
        request.is_active,
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Brand not found".to_string()))?;

    let entity = repo
        .find_with_count(brand_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Brand not found".to_string()))?;

    info!(brand_id = %brand_id, "Brand updated");
    Ok(Json(brand_response(entity)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_request_rejects_slug() {
        let result: Result<UpdateBrandRequest, _> =
            serde_json::from_str(r#"{"slug":"new-slug"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_list_query_and_page_share_query_string() {
        let query: ListBrandsQuery = parse_query("is_active=true&page=2");
        assert_eq!(query.is_active, Some(true));
        let page: PageRequest = parse_query("is_active=true&page=2");
        assert_eq!(page.page(), 2);
    }

    fn parse_query<T: serde::de::DeserializeOwned>(qs: &str) -> T {
        let uri: axum::http::Uri = format!("/brands?{}", qs).parse().unwrap();
        Query::<T>::try_from_uri(&uri).unwrap().0
    }
}
