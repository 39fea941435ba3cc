//! Administrative statistics.

use axum::{extract::State, Json};
use domain::models::{AdminStats, LicenseStatus, LicenseStatusCounts};
use persistence::entities::LicenseStatusDb;
use persistence::repositories::{ActivationRepository, LicenseRepository, StatsRepository};

use crate::app::AppState;
use crate::error::ApiError;

fn status_counts(rows: Vec<(LicenseStatusDb, i64)>) -> LicenseStatusCounts {
    let mut counts = LicenseStatusCounts::default();
    for (status, total) in rows {
        match LicenseStatus::from(status) {
            LicenseStatus::Active => counts.active += total,
            LicenseStatus::Suspended => counts.suspended += total,
            LicenseStatus::Cancelled => counts.cancelled += total,
            LicenseStatus::Expired => counts.expired += total,
        }
    }
    counts
}

/// Registry and license counts. Licenses are grouped by effective status.
///
/// GET /api/v1/admin/stats
pub async fn stats(State(state): State<AppState>) -> Result<Json<AdminStats>, ApiError> {
    let registry = StatsRepository::new(state.pool.clone())
        .registry_counts()
        .await?;
    let licenses = LicenseRepository::new(state.pool.clone())
        .count_by_effective_status()
        .await?;
    let active_activations = ActivationRepository::new(state.pool.clone())
        .count_active()
        .await?;

    Ok(Json(AdminStats {
        brands: registry.brands,
        active_brands: registry.active_brands,
        products: registry.products,
        license_keys: registry.license_keys,
        licenses: status_counts(licenses),
        active_activations,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_counts_from_rows() {
        let counts = status_counts(vec![
            (LicenseStatusDb::Active, 5),
            (LicenseStatusDb::Expired, 2),
            (LicenseStatusDb::Cancelled, 1),
        ]);
        assert_eq!(counts.active, 5);
        assert_eq!(counts.suspended, 0);
        assert_eq!(counts.expired, 2);
        assert_eq!(counts.total(), 8);
    }
}
