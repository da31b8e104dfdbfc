pub mod seed;
pub mod store;

pub use seed::StoreSeed;
pub use store::*;

use crate::error::Result;
use crate::models::{
    Alarm, AlarmState, CorrelationRule, EscalationPolicy, MaintenanceWindow, NotificationPolicy,
    PolicyStatus, RuleStatus, WindowStatus,
};
use async_trait::async_trait;

/// Entity query and persistence interface the decision engines run against
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Get an alarm by ID
    async fn get_alarm(&self, alarm_id: &str) -> Result<Option<Alarm>>;

    /// Create or overwrite an alarm
    async fn save_alarm(&self, alarm: &Alarm) -> Result<()>;

    /// Update an existing alarm by primary key
    async fn update_alarm(&self, alarm: &Alarm) -> Result<()>;

    /// List alarms matching the filter
    async fn list_alarms(&self, filter: &AlarmFilter) -> Result<Vec<Alarm>>;

    /// List correlation rules with the given status
    async fn list_correlation_rules(&self, status: RuleStatus) -> Result<Vec<CorrelationRule>>;

    /// List escalation policies with the given status
    async fn list_escalation_policies(&self, status: PolicyStatus)
        -> Result<Vec<EscalationPolicy>>;

    /// List notification policies with the given status
    async fn list_notification_policies(
        &self,
        status: PolicyStatus,
    ) -> Result<Vec<NotificationPolicy>>;

    /// List maintenance windows with the given status
    async fn list_maintenance_windows(&self, status: WindowStatus)
        -> Result<Vec<MaintenanceWindow>>;
}

/// Filter for querying alarms
#[derive(Debug, Clone, Default)]
pub struct AlarmFilter {
    /// Accepted states (empty = any)
    pub states: Vec<AlarmState>,
}

impl AlarmFilter {
    pub fn active() -> Self {
        Self {
            states: vec![AlarmState::Active],
        }
    }

    pub fn matches(&self, alarm: &Alarm) -> bool {
        self.states.is_empty() || self.states.contains(&alarm.state)
    }
}
