//! License key entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the license_keys table.
#[derive(Debug, Clone, FromRow)]
pub struct LicenseKeyEntity {
    pub id: Uuid,
    pub key: Uuid,
    pub brand_id: Uuid,
    pub customer_email: String,
    pub total_seats: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// License key row joined with its brand name and license count.
#[derive(Debug, Clone, FromRow)]
pub struct LicenseKeySummaryEntity {
    #[sqlx(flatten)]
    pub key: LicenseKeyEntity,
    pub brand_name: String,
    pub license_count: i64,
}

impl From<LicenseKeyEntity> for domain::models::LicenseKey {
    fn from(entity: LicenseKeyEntity) -> Self {
        Self {
            id: entity.id,
            key: entity.key,
            brand_id: entity.brand_id,
            customer_email: entity.customer_email,
            total_seats: entity.total_seats,
            is_active: entity.is_active,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::models::LicenseKey;
    use fake::faker::internet::en::SafeEmail;
    use fake::Fake;

    #[test]
    fn test_license_key_entity_to_domain() {
        let email: String = SafeEmail().fake();
        let entity = LicenseKeyEntity {
            id: Uuid::new_v4(),
            key: Uuid::new_v4(),
            brand_id: Uuid::new_v4(),
            customer_email: email.clone(),
            total_seats: 3,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let key: LicenseKey = entity.clone().into();

        assert_eq!(key.key, entity.key);
        assert_eq!(key.total_seats, 3);
        assert_eq!(key.customer_email, email);
    }
}
