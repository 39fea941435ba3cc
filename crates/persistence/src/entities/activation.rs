//! Activation entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the activations table.
#[derive(Debug, Clone, FromRow)]
pub struct ActivationEntity {
    pub id: Uuid,
    pub license_id: Uuid,
    pub instance_identifier: String,
    pub instance_type: String,
    pub is_active: bool,
    pub activated_at: DateTime<Utc>,
    pub deactivated_at: Option<DateTime<Utc>>,
    pub deactivation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ActivationEntity> for domain::models::Activation {
    fn from(entity: ActivationEntity) -> Self {
        Self {
            id: entity.id,
            license_id: entity.license_id,
            instance_identifier: entity.instance_identifier,
            instance_type: entity.instance_type,
            is_active: entity.is_active,
            activated_at: entity.activated_at,
            deactivated_at: entity.deactivated_at,
            deactivation_reason: entity.deactivation_reason,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}
