use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::alarm::Alarm;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WindowStatus {
    #[default]
    Scheduled,
    Active,
    Completed,
    Cancelled,
}

/// Planned maintenance during which alarms and/or notifications are suppressed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MaintenanceWindow {
    pub window_id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub status: WindowStatus,

    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,

    /// Scope; all three empty means the window is global
    #[serde(default)]
    pub node_ids: Vec<String>,
    #[serde(default)]
    pub node_types: Vec<String>,
    #[serde(default)]
    pub locations: Vec<String>,

    #[serde(default)]
    pub suppress_alarms: bool,
    #[serde(default)]
    pub suppress_notifications: bool,
}

impl MaintenanceWindow {
    /// Window is in effect at `now` (both bounds inclusive)
    pub fn is_time_active(&self, now: DateTime<Utc>) -> bool {
        self.start_time <= now && now <= self.end_time
    }

    pub fn is_global(&self) -> bool {
        self.node_ids.is_empty() && self.node_types.is_empty() && self.locations.is_empty()
    }

    /// Alarm falls inside the window scope (node ID, node type or location)
    pub fn matches_scope(&self, alarm: &Alarm) -> bool {
        if self.is_global() {
            return true;
        }

        if self.node_ids.iter().any(|id| *id == alarm.node_id) {
            return true;
        }

        if let Some(node_type) = alarm.node_type() {
            if self.node_types.iter().any(|t| t == node_type) {
                return true;
            }
        }

        self.locations.iter().any(|loc| *loc == alarm.location)
    }
}
