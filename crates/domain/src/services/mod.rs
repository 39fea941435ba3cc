//! Domain services: license lifecycle and seat ledger rules.

pub mod lifecycle;
pub mod seats;

pub use lifecycle::{apply, LifecycleCommand, TransitionRecord};
pub use seats::{
    check_seat_override, deactivate, plan_activation, ActivationPlan, BulkDeactivateReport,
    BulkItemResult, BulkItemStatus, SeatUsage,
};
