//! Maintenance window matching for alarm and notification suppression.

mod checker;

pub use checker::{CheckResult, MaintenanceWindowChecker, MAINTENANCE_SUPPRESSION_PREFIX};
