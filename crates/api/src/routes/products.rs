//! Product registry endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use domain::models::product::{
    CreateProductRequest, ListProductsQuery, ProductResponse, UpdateProductRequest,
};
use persistence::entities::ProductWithBrandEntity;
use persistence::repositories::{BrandRepository, ProductRepository};
use shared::pagination::{PageRequest, Paginated};
use tracing::info;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::ValidJson;

fn product_response(entity: ProductWithBrandEntity) -> ProductResponse {
    ProductResponse::new(entity.product.into(), entity.brand_name)
}

/// Create a product under a brand.
///
/// POST /api/v1/products
pub async fn create_product(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<CreateProductRequest>,
) -> Result<(StatusCode, Json<ProductResponse>), ApiError> {
    let brand = BrandRepository::new(state.pool.clone())
        .find_by_id(request.brand_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Brand not found".to_string()))?;

    let entity = ProductRepository::new(state.pool.clone())
        .create(
            brand.id,
            request.name.trim(),
            &request.slug,
            &request.description,
            request.is_active,
        )
        .await?;

    info!(
        product_id = %entity.id,
        brand_id = %brand.id,
        slug = %entity.slug,
        "Product created"
    );

    Ok((
        StatusCode::CREATED,
        Json(ProductResponse::new(entity.into(), brand.name)),
    ))
}

/// List products, optionally for one brand.
///
/// GET /api/v1/products?brand_id=&is_active=&page=&per_page=
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ListProductsQuery>,
    Query(page): Query<PageRequest>,
) -> Result<Json<Paginated<ProductResponse>>, ApiError> {
    let repo = ProductRepository::new(state.pool.clone());
    let total = repo.count(query.brand_id, query.is_active).await?;
    let products = repo
        .list(query.brand_id, query.is_active, page.limit(), page.offset())
        .await?
        .into_iter()
        .map(product_response)
        .collect();

    Ok(Json(Paginated::new(products, &page, total)))
}

/// Get a product by ID.
///
/// GET /api/v1/products/:product_id
pub async fn get_product(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> Result<Json<ProductResponse>, ApiError> {
    let entity = ProductRepository::new(state.pool.clone())
        .find_with_brand(product_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Product not found".to_string()))?;

    Ok(Json(product_response(entity)))
}

/// Update a product. The slug must stay unique within its brand.
///
/// PATCH /api/v1/products/:product_id
pub async fn update_product(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
    ValidJson(request): ValidJson<UpdateProductRequest>,
) -> Result<Json<ProductResponse>, ApiError> {
    let repo = ProductRepository::new(state.pool.clone());
    repo.update(
        product_id,
        request.name.as_deref().map(str::trim),
        request.slug.as_deref(),
        request.description.as_deref(),
        request.is_active,
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Product not found".to_string()))?;

    let entity = repo
        .find_with_brand(product_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Product not found".to_string()))?;

    info!(product_id = %product_id, "Product updated");
    Ok(Json(product_response(entity)))
}
