use crate::clock::Clock;
use crate::models::{Alarm, WindowStatus};
use crate::state::EntityStore;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// Prefix of `suppressed_by` for alarms suppressed by a maintenance window
pub const MAINTENANCE_SUPPRESSION_PREFIX: &str = "maintenance:";

/// Outcome of a maintenance window check
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CheckResult {
    pub in_window: bool,
    pub suppress_alarms: bool,
    pub suppress_notifications: bool,
    pub window_id: Option<String>,
}

impl CheckResult {
    /// `suppressed_by` marker for the matched window
    pub fn suppressed_by(&self) -> Option<String> {
        self.window_id
            .as_ref()
            .map(|id| format!("{}{}", MAINTENANCE_SUPPRESSION_PREFIX, id))
    }
}

/// Finds the active maintenance window covering an alarm
pub struct MaintenanceWindowChecker {
    store: Arc<dyn EntityStore>,
    clock: Arc<dyn Clock>,
}

impl MaintenanceWindowChecker {
    pub fn new(store: Arc<dyn EntityStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Check the alarm against ACTIVE windows; the first window that is in
    /// effect now and covers the alarm wins. Store failures yield "not in a window".
    pub async fn check(&self, alarm: &Alarm) -> CheckResult {
        let windows = match self.store.list_maintenance_windows(WindowStatus::Active).await {
            Ok(windows) => windows,
            Err(e) => {
                warn!(alarm_id = %alarm.alarm_id, error = %e, "Failed to load maintenance windows");
                return CheckResult::default();
            }
        };

        let now = self.clock.now();

        let Some(window) = windows
            .iter()
            .find(|w| w.is_time_active(now) && w.matches_scope(alarm))
        else {
            return CheckResult::default();
        };

        debug!(
            alarm_id = %alarm.alarm_id,
            window_id = %window.window_id,
            suppress_alarms = window.suppress_alarms,
            suppress_notifications = window.suppress_notifications,
            "Alarm is inside a maintenance window"
        );

        CheckResult {
            in_window: true,
            suppress_alarms: window.suppress_alarms,
            suppress_notifications: window.suppress_notifications,
            window_id: Some(window.window_id.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::models::{MaintenanceWindow, Severity};
    use crate::state::InMemoryStore;
    use chrono::{Duration, TimeZone, Utc};

    fn window(id: &str, status: WindowStatus, locations: &[&str]) -> MaintenanceWindow {
        let start = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        MaintenanceWindow {
            window_id: id.to_string(),
            name: id.to_string(),
            status,
            start_time: start,
            end_time: start + Duration::hours(4),
            node_ids: Vec::new(),
            node_types: Vec::new(),
            locations: locations.iter().map(|l| l.to_string()).collect(),
            suppress_alarms: true,
            suppress_notifications: false,
        }
    }

    fn checker(store: InMemoryStore, hours_in: i64) -> MaintenanceWindowChecker {
        let clock = ManualClock::new(
            Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap() + Duration::hours(hours_in),
        );
        MaintenanceWindowChecker::new(Arc::new(store), Arc::new(clock))
    }

    #[tokio::test]
    async fn test_first_matching_window_wins() {
        let store = InMemoryStore::new();
        store.put_maintenance_window(window("scheduled", WindowStatus::Scheduled, &[]));
        store.put_maintenance_window(window("west", WindowStatus::Active, &["DC-West"]));
        store.put_maintenance_window(window("east", WindowStatus::Active, &["DC-East"]));
        let mut global = window("global", WindowStatus::Active, &[]);
        global.suppress_alarms = false;
        store.put_maintenance_window(global);

        let alarm = Alarm::new("a", "d", "n", "x", Severity::Major).with_location("DC-East");
        let result = checker(store, 1).check(&alarm).await;

        assert!(result.in_window);
        assert!(result.suppress_alarms);
        assert_eq!(result.window_id.as_deref(), Some("east"));
        assert_eq!(result.suppressed_by().as_deref(), Some("maintenance:east"));
    }

    #[tokio::test]
    async fn test_outside_time_range() {
        let store = InMemoryStore::new();
        store.put_maintenance_window(window("east", WindowStatus::Active, &["DC-East"]));

        let alarm = Alarm::new("a", "d", "n", "x", Severity::Major).with_location("DC-East");
        let result = checker(store, 5).check(&alarm).await;

        assert_eq!(result, CheckResult::default());
    }
}
