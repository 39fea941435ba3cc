//! License event entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::LifecycleOperation;
use sqlx::FromRow;
use uuid::Uuid;

use super::license::LicenseStatusDb;

/// Database enum for license_operation that maps to PostgreSQL enum type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "license_operation", rename_all = "lowercase")]
pub enum LicenseOperationDb {
    Renew,
    Suspend,
    Resume,
    Cancel,
}

impl From<LicenseOperationDb> for LifecycleOperation {
    fn from(db_op: LicenseOperationDb) -> Self {
        match db_op {
            LicenseOperationDb::Renew => LifecycleOperation::Renew,
            LicenseOperationDb::Suspend => LifecycleOperation::Suspend,
            LicenseOperationDb::Resume => LifecycleOperation::Resume,
            LicenseOperationDb::Cancel => LifecycleOperation::Cancel,
        }
    }
}

impl From<LifecycleOperation> for LicenseOperationDb {
    fn from(op: LifecycleOperation) -> Self {
        match op {
            LifecycleOperation::Renew => LicenseOperationDb::Renew,
            LifecycleOperation::Suspend => LicenseOperationDb::Suspend,
            LifecycleOperation::Resume => LicenseOperationDb::Resume,
            LifecycleOperation::Cancel => LicenseOperationDb::Cancel,
        }
    }
}

/// Database row mapping for the license_events table.
#[derive(Debug, Clone, FromRow)]
pub struct LicenseEventEntity {
    pub id: Uuid,
    pub license_id: Uuid,
    pub operation: LicenseOperationDb,
    pub actor: String,
    pub from_status: LicenseStatusDb,
    pub to_status: LicenseStatusDb,
    pub reason: Option<String>,
    pub details: serde_json::Value,
    pub occurred_at: DateTime<Utc>,
}

impl From<LicenseEventEntity> for domain::models::LicenseEvent {
    fn from(entity: LicenseEventEntity) -> Self {
        Self {
            id: entity.id,
            license_id: entity.license_id,
            operation: entity.operation.into(),
            actor: entity.actor,
            from_status: entity.from_status.into(),
            to_status: entity.to_status.into(),
            reason: entity.reason,
            details: entity.details,
            occurred_at: entity.occurred_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::models::{LicenseEvent, LicenseStatus};

    #[test]
    fn test_license_event_entity_to_domain() {
        let entity = LicenseEventEntity {
            id: Uuid::new_v4(),
            license_id: Uuid::new_v4(),
            operation: LicenseOperationDb::Suspend,
            actor: "billing-bot".to_string(),
            from_status: LicenseStatusDb::Active,
            to_status: LicenseStatusDb::Suspended,
            reason: Some("chargeback".to_string()),
            details: serde_json::json!({}),
            occurred_at: Utc::now(),
        };
        let event: LicenseEvent = entity.clone().into();

        assert_eq!(event.operation, LifecycleOperation::Suspend);
        assert_eq!(event.from_status, LicenseStatus::Active);
        assert_eq!(event.to_status, LicenseStatus::Suspended);
        assert_eq!(event.actor, "billing-bot");
    }
}
