//! Brand domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// A brand owns products and the license keys sold under it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Brand {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

/// Request payload for creating a brand.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateBrandRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    #[validate(length(min = 1, max = 100, message = "Slug must be 1-100 characters"))]
    #[validate(custom(function = "shared::validation::validate_slug"))]
    pub slug: String,

    #[serde(default)]
    #[validate(length(max = 2000, message = "Description cannot exceed 2000 characters"))]
    pub description: String,

    #[serde(default = "default_active")]
    pub is_active: bool,
}

/// Request payload for updating a brand (partial update).
///
/// The slug is immutable once a brand exists, so it is not accepted here.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UpdateBrandRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: Option<String>,

    #[validate(length(max = 2000, message = "Description cannot exceed 2000 characters"))]
    pub description: Option<String>,

    pub is_active: Option<bool>,
}

impl UpdateBrandRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.is_active.is_none()
    }
}

/// Query parameters for listing brands.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListBrandsQuery {
    pub is_active: Option<bool>,
}

/// Response payload for brand operations.
#[derive(Debug, Clone, Serialize)]
pub struct BrandResponse {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub is_active: bool,
    pub product_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BrandResponse {
    pub fn new(brand: Brand, product_count: i64) -> Self {
        Self {
            id: brand.id,
            name: brand.name,
            slug: brand.slug,
            description: brand.description,
            is_active: brand.is_active,
            product_count,
            created_at: brand.created_at,
            updated_at: brand.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fake::faker::company::en::CompanyName;
    use fake::Fake;

    #[test]
    fn test_create_request_defaults() {
        let name: String = CompanyName().fake();
        let json = serde_json::json!({ "name": name, "slug": "rankmath" });
        let req: CreateBrandRequest = serde_json::from_value(json).unwrap();
        assert!(req.is_active);
        assert_eq!(req.description, "");
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_create_request_rejects_bad_slug() {
        let req: CreateBrandRequest =
            serde_json::from_str(r#"{"name":"RankMath","slug":"Rank Math"}"#).unwrap();
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("slug"));
    }

    #[test]
    fn test_create_request_rejects_empty_name() {
        let req: CreateBrandRequest =
            serde_json::from_str(r#"{"name":"","slug":"rankmath"}"#).unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_update_request_rejects_slug() {
        let result: Result<UpdateBrandRequest, _> =
            serde_json::from_str(r#"{"slug":"new-slug"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_update_request_is_empty() {
        assert!(UpdateBrandRequest::default().is_empty());
        let req: UpdateBrandRequest = serde_json::from_str(r#"{"is_active":false}"#).unwrap();
        assert!(!req.is_empty());
    }

    #[test]
    fn test_response_carries_product_count() {
        let now = Utc::now();
        let brand = Brand {
            id: Uuid::new_v4(),
            name: "WP Rocket".into(),
            slug: "wp-rocket".into(),
            description: String::new(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        let response = BrandResponse::new(brand, 3);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["product_count"], 3);
        assert_eq!(json["slug"], "wp-rocket");
    }
}
