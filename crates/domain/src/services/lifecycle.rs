//! License lifecycle state machine.
//!
//! ```text
//! active ──suspend──▶ suspended ──resume──▶ active
//!   │                    │
//!   │ (expiration date passes, derived at read time)
//!   ▼                    ▼
//! expired ◀──────────────┘
//!   │ renew ──▶ active
//!
//! active | suspended | expired ──cancel──▶ cancelled (terminal)
//! ```
//!
//! Every check runs against the effective status, so a stored `active` row
//! whose expiration date has passed behaves as `expired`. A successful
//! transition mutates the license in place and returns the audit record the
//! caller must persist alongside it.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;

use crate::error::DomainError;
use crate::models::{License, LicenseStatus, LifecycleOperation};

/// A lifecycle operation together with its arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum LifecycleCommand {
    Renew {
        new_expiration: DateTime<Utc>,
        reason: Option<String>,
    },
    Suspend {
        reason: String,
    },
    Resume,
    Cancel {
        reason: String,
    },
}

impl LifecycleCommand {
    pub fn operation(&self) -> LifecycleOperation {
        match self {
            LifecycleCommand::Renew { .. } => LifecycleOperation::Renew,
            LifecycleCommand::Suspend { .. } => LifecycleOperation::Suspend,
            LifecycleCommand::Resume => LifecycleOperation::Resume,
            LifecycleCommand::Cancel { .. } => LifecycleOperation::Cancel,
        }
    }
}

/// Audit record of an applied transition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransitionRecord {
    pub operation: LifecycleOperation,
    pub from: LicenseStatus,
    pub to: LicenseStatus,
    pub reason: Option<String>,
    pub details: serde_json::Value,
    pub occurred_at: DateTime<Utc>,
}

/// Applies `command` to `license` as of `now`.
///
/// On error the license is left untouched.
pub fn apply(
    license: &mut License,
    command: LifecycleCommand,
    now: DateTime<Utc>,
) -> Result<TransitionRecord, DomainError> {
    let from = license.effective_status_at(now);
    let operation = command.operation();
    require_allowed(from, operation)?;

    let (reason, details) = match command {
        LifecycleCommand::Renew {
            new_expiration,
            reason,
        } => {
            let floor = if from == LicenseStatus::Active {
                license.expiration_date
            } else {
                now
            };
            if new_expiration <= floor {
                return Err(DomainError::validation(if from == LicenseStatus::Active {
                    "New expiration date must be after the current expiration date"
                } else {
                    "New expiration date must be in the future"
                }));
            }

            let previous = license.expiration_date;
            if license.original_expiration_date.is_none() {
                license.original_expiration_date = Some(previous);
            }
            license.expiration_date = new_expiration;
            license.renewal_count += 1;
            license.status = LicenseStatus::Active;

            let details = json!({
                "previous_expiration_date": previous,
                "new_expiration_date": new_expiration,
                "renewal_count": license.renewal_count,
            });
            (normalize_optional(reason), details)
        }
        LifecycleCommand::Suspend { reason } => {
            let reason = require_reason(reason)?;
            license.status = LicenseStatus::Suspended;
            license.suspension_reason = Some(reason.clone());
            license.suspended_at = Some(now);
            (Some(reason), json!({}))
        }
        LifecycleCommand::Resume => {
            let details = json!({
                "suspension_reason": license.suspension_reason.take(),
                "suspended_at": license.suspended_at.take(),
            });
            license.status = LicenseStatus::Active;
            (None, details)
        }
        LifecycleCommand::Cancel { reason } => {
            let reason = require_reason(reason)?;
            license.status = LicenseStatus::Cancelled;
            license.cancellation_reason = Some(reason.clone());
            license.cancelled_at = Some(now);
            (Some(reason), json!({}))
        }
    };

    license.updated_at = now;

    tracing::debug!(
        license_id = %license.id,
        operation = %operation,
        from = %from,
        to = %license.status,
        "Applied license transition"
    );

    Ok(TransitionRecord {
        operation,
        from,
        to: license.status,
        reason,
        details,
        occurred_at: now,
    })
}

fn require_allowed(from: LicenseStatus, operation: LifecycleOperation) -> Result<(), DomainError> {
    if operation.is_allowed_from(from) {
        Ok(())
    } else {
        Err(DomainError::InvalidTransition { from, operation })
    }
}

fn require_reason(reason: String) -> Result<String, DomainError> {
    let trimmed = reason.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation("Reason cannot be blank"));
    }
    Ok(trimmed.to_string())
}

fn normalize_optional(reason: Option<String>) -> Option<String> {
    reason
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use uuid::Uuid;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap()
    }

    fn license(status: LicenseStatus, expiration: DateTime<Utc>) -> License {
        let created = expiration - Duration::days(365);
        License {
            id: Uuid::new_v4(),
            license_key_id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            status,
            expiration_date: expiration,
            original_expiration_date: None,
            renewal_count: 0,
            suspension_reason: None,
            suspended_at: None,
            cancellation_reason: None,
            cancelled_at: None,
            created_at: created,
            updated_at: created,
        }
    }

    fn active() -> License {
        license(LicenseStatus::Active, now() + Duration::days(30))
    }

    fn suspend(reason: &str) -> LifecycleCommand {
        LifecycleCommand::Suspend {
            reason: reason.to_string(),
        }
    }

    fn cancel(reason: &str) -> LifecycleCommand {
        LifecycleCommand::Cancel {
            reason: reason.to_string(),
        }
    }

    fn renew(until: DateTime<Utc>) -> LifecycleCommand {
        LifecycleCommand::Renew {
            new_expiration: until,
            reason: None,
        }
    }

    #[test]
    fn test_renew_active_extends_expiration() {
        let mut lic = active();
        let original = lic.expiration_date;
        let target = original + Duration::days(365);

        let record = apply(&mut lic, renew(target), now()).unwrap();

        assert_eq!(lic.status, LicenseStatus::Active);
        assert_eq!(lic.expiration_date, target);
        assert_eq!(lic.original_expiration_date, Some(original));
        assert_eq!(lic.renewal_count, 1);
        assert_eq!(record.from, LicenseStatus::Active);
        assert_eq!(record.to, LicenseStatus::Active);
        assert_eq!(record.details["renewal_count"], 1);
    }

    #[test]
    fn test_second_renewal_keeps_original_expiration() {
        let mut lic = active();
        let original = lic.expiration_date;
        apply(&mut lic, renew(original + Duration::days(10)), now()).unwrap();
        apply(&mut lic, renew(original + Duration::days(20)), now()).unwrap();

        assert_eq!(lic.original_expiration_date, Some(original));
        assert_eq!(lic.renewal_count, 2);
    }

    #[test]
    fn test_renew_active_requires_later_date() {
        let mut lic = active();
        let before = lic.clone();
        let same = lic.expiration_date;
        let err = apply(&mut lic, renew(same), now()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(lic, before);
    }

    #[test]
    fn test_renew_expired_license() {
        let mut lic = license(LicenseStatus::Active, now() - Duration::days(3));
        let target = now() + Duration::days(30);

        let record = apply(&mut lic, renew(target), now()).unwrap();

        assert_eq!(record.from, LicenseStatus::Expired);
        assert_eq!(lic.effective_status_at(now()), LicenseStatus::Active);
        assert_eq!(lic.expiration_date, target);
    }

    #[test]
    fn test_renew_expired_requires_future_date() {
        let mut lic = license(LicenseStatus::Active, now() - Duration::days(3));
        // Later than the old expiration but still in the past.
        let err = apply(&mut lic, renew(now() - Duration::days(1)), now()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(lic.renewal_count, 0);
    }

    #[test]
    fn test_renew_lapsed_suspension_reactivates() {
        let mut lic = license(LicenseStatus::Suspended, now() - Duration::days(1));
        lic.suspension_reason = Some("unpaid".into());
        let record = apply(&mut lic, renew(now() + Duration::days(90)), now()).unwrap();
        assert_eq!(record.from, LicenseStatus::Expired);
        assert_eq!(lic.status, LicenseStatus::Active);
    }

    #[test]
    fn test_renew_suspended_is_invalid() {
        let mut lic = license(LicenseStatus::Suspended, now() + Duration::days(30));
        let err = apply(&mut lic, renew(now() + Duration::days(400)), now()).unwrap_err();
        assert_eq!(
            err,
            DomainError::InvalidTransition {
                from: LicenseStatus::Suspended,
                operation: LifecycleOperation::Renew,
            }
        );
    }

    #[test]
    fn test_renew_cancelled_is_invalid() {
        for expiration in [now() + Duration::days(30), now() - Duration::days(30)] {
            let mut lic = license(LicenseStatus::Cancelled, expiration);
            let err = apply(&mut lic, renew(now() + Duration::days(400)), now()).unwrap_err();
            assert!(matches!(
                err,
                DomainError::InvalidTransition {
                    from: LicenseStatus::Cancelled,
                    ..
                }
            ));
        }
    }

    #[test]
    fn test_suspend_then_resume_restores_active() {
        let mut lic = active();
        let expiration = lic.expiration_date;

        let record = apply(&mut lic, suspend("chargeback"), now()).unwrap();
        assert_eq!(record.to, LicenseStatus::Suspended);
        assert_eq!(lic.suspension_reason.as_deref(), Some("chargeback"));
        assert_eq!(lic.suspended_at, Some(now()));

        let later = now() + Duration::hours(2);
        let record = apply(&mut lic, LifecycleCommand::Resume, later).unwrap();
        assert_eq!(record.from, LicenseStatus::Suspended);
        assert_eq!(record.details["suspension_reason"], "chargeback");
        assert_eq!(lic.status, LicenseStatus::Active);
        assert_eq!(lic.expiration_date, expiration);
        assert!(lic.suspension_reason.is_none());
        assert!(lic.suspended_at.is_none());
    }

    #[test]
    fn test_suspend_requires_active() {
        let mut lic = license(LicenseStatus::Suspended, now() + Duration::days(5));
        assert!(matches!(
            apply(&mut lic, suspend("again"), now()),
            Err(DomainError::InvalidTransition { .. })
        ));

        let mut expired = license(LicenseStatus::Active, now() - Duration::days(5));
        assert_eq!(
            apply(&mut expired, suspend("late"), now()).unwrap_err(),
            DomainError::InvalidTransition {
                from: LicenseStatus::Expired,
                operation: LifecycleOperation::Suspend,
            }
        );
    }

    #[test]
    fn test_suspend_rejects_blank_reason() {
        let mut lic = active();
        let err = apply(&mut lic, suspend("   "), now()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(lic.status, LicenseStatus::Active);
    }

    #[test]
    fn test_resume_requires_suspended() {
        let mut lic = active();
        let err = apply(&mut lic, LifecycleCommand::Resume, now()).unwrap_err();
        assert_eq!(
            err,
            DomainError::InvalidTransition {
                from: LicenseStatus::Active,
                operation: LifecycleOperation::Resume,
            }
        );
    }

    #[test]
    fn test_resume_after_expiry_is_invalid() {
        let mut lic = license(LicenseStatus::Suspended, now() - Duration::days(1));
        let err = apply(&mut lic, LifecycleCommand::Resume, now()).unwrap_err();
        assert!(matches!(
            err,
            DomainError::InvalidTransition {
                from: LicenseStatus::Expired,
                ..
            }
        ));
    }

    #[test]
    fn test_cancel_from_each_open_status() {
        let cases = [
            license(LicenseStatus::Active, now() + Duration::days(5)),
            license(LicenseStatus::Suspended, now() + Duration::days(5)),
            license(LicenseStatus::Active, now() - Duration::days(5)),
        ];
        for mut lic in cases {
            let from = lic.effective_status_at(now());
            let record = apply(&mut lic, cancel("refund"), now()).unwrap();
            assert_eq!(record.from, from);
            assert_eq!(lic.status, LicenseStatus::Cancelled);
            assert_eq!(lic.cancellation_reason.as_deref(), Some("refund"));
            assert_eq!(lic.cancelled_at, Some(now()));
        }
    }

    #[test]
    fn test_cancel_twice_leaves_state_unchanged() {
        let mut lic = active();
        apply(&mut lic, cancel("refund"), now()).unwrap();
        let snapshot = lic.clone();

        let err = apply(&mut lic, cancel("again"), now() + Duration::minutes(1)).unwrap_err();
        assert!(matches!(err, DomainError::InvalidTransition { .. }));
        assert_eq!(lic, snapshot);
    }

    #[test]
    fn test_cancelled_has_no_outbound_transitions() {
        let mut lic = license(LicenseStatus::Cancelled, now() + Duration::days(30));
        let commands = [
            renew(now() + Duration::days(400)),
            suspend("x"),
            LifecycleCommand::Resume,
            cancel("x"),
        ];
        for command in commands {
            assert!(apply(&mut lic, command, now()).is_err());
        }
        assert_eq!(lic.status, LicenseStatus::Cancelled);
    }

    #[test]
    fn test_record_reason_is_trimmed() {
        let mut lic = active();
        let command = LifecycleCommand::Renew {
            new_expiration: lic.expiration_date + Duration::days(1),
            reason: Some("  annual  ".into()),
        };
        let record = apply(&mut lic, command, now()).unwrap();
        assert_eq!(record.reason.as_deref(), Some("annual"));
        assert_eq!(record.occurred_at, now());
        assert_eq!(lic.updated_at, now());
    }
}
