use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::alarm::{Alarm, Severity, WriteAction};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum PolicyStatus {
    #[default]
    Active,
    #[serde(alias = "DISABLED")]
    Inactive,
}

/// Outbound channel for notifications and escalation steps
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NotificationChannel {
    Email,
    Webhook,
    Slack,
    #[serde(alias = "pager_duty")]
    Pagerduty,
    Custom,
}

/// Escalation policy defines how an unacknowledged alarm is escalated
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct EscalationPolicy {
    pub policy_id: String,
    pub name: String,
    pub status: PolicyStatus,

    /// Lowest severity the policy applies to
    pub min_severity: Option<Severity>,

    /// Restrict the policy to these alarm definitions (empty = any)
    pub alarm_definition_ids: Vec<String>,

    /// Timed steps, fired in ascending `step_order`
    pub steps: Vec<EscalationStep>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EscalationStep {
    pub step_order: u32,

    /// Delay before this step fires, counted from the previous step
    #[serde(default)]
    pub delay_minutes: u32,

    pub channel: NotificationChannel,

    #[serde(default)]
    pub endpoint: String,

    #[serde(default)]
    pub message_template: String,
}

impl EscalationPolicy {
    /// Check if an alarm falls in the policy's scope
    pub fn matches(&self, alarm: &Alarm) -> bool {
        if let Some(min) = self.min_severity {
            if alarm.severity < min {
                return false;
            }
        }

        self.alarm_definition_ids.is_empty()
            || self.alarm_definition_ids.contains(&alarm.definition_id)
    }

    /// Steps sorted by `step_order`
    pub fn ordered_steps(&self) -> Vec<EscalationStep> {
        let mut steps = self.steps.clone();
        steps.sort_by_key(|s| s.step_order);
        steps
    }
}

/// Notification policy defines who is told about an alarm, and how often
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct NotificationPolicy {
    pub policy_id: String,
    pub name: String,
    pub status: PolicyStatus,
    pub min_severity: Option<Severity>,

    /// Also notify on REPLACE/PARTIAL_UPDATE writes
    pub notify_on_state_change: bool,

    /// Minimum seconds between two notifications for the same alarm
    pub cooldown_seconds: u64,

    /// Cap per wall-clock hour for the whole policy (0 = unlimited)
    pub max_notifications_per_hour: u32,

    pub alarm_definition_ids: Vec<String>,

    /// Allowed `nodeType` attribute values (empty = any)
    pub node_type_filter: Vec<String>,

    pub targets: Vec<NotificationTarget>,
}

impl NotificationPolicy {
    /// Check if the policy applies to a write of `alarm`
    pub fn matches(&self, alarm: &Alarm, action: WriteAction) -> bool {
        if action.is_state_change() && !self.notify_on_state_change {
            return false;
        }

        if let Some(min) = self.min_severity {
            if alarm.severity < min {
                return false;
            }
        }

        if !self.alarm_definition_ids.is_empty()
            && !self.alarm_definition_ids.contains(&alarm.definition_id)
        {
            return false;
        }

        if !self.node_type_filter.is_empty() {
            return alarm
                .node_type()
                .is_some_and(|t| self.node_type_filter.iter().any(|f| f == t));
        }

        true
    }

    /// Key of the per-alarm cooldown entry
    pub fn cooldown_key(&self, alarm_id: &str) -> String {
        format!("{}:{}", alarm_id, self.policy_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NotificationTarget {
    pub channel: NotificationChannel,

    #[serde(default)]
    pub endpoint: String,

    #[serde(default)]
    pub template: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(order: u32, delay: u32) -> EscalationStep {
        EscalationStep {
            step_order: order,
            delay_minutes: delay,
            channel: NotificationChannel::Email,
            endpoint: format!("oncall-{}@example.com", order),
            message_template: String::new(),
        }
    }

    #[test]
    fn test_escalation_policy_scope() {
        let policy = EscalationPolicy {
            policy_id: "esc-1".to_string(),
            min_severity: Some(Severity::Major),
            alarm_definition_ids: vec!["def-1".to_string()],
            ..Default::default()
        };

        let major = Alarm::new("a", "def-1", "n", "x", Severity::Major);
        let minor = Alarm::new("b", "def-1", "n", "x", Severity::Minor);
        let other_def = Alarm::new("c", "def-2", "n", "x", Severity::Critical);

        assert!(policy.matches(&major));
        assert!(!policy.matches(&minor));
        assert!(!policy.matches(&other_def));
    }

    #[test]
    fn test_ordered_steps() {
        let policy = EscalationPolicy {
            steps: vec![step(3, 30), step(1, 5), step(2, 15)],
            ..Default::default()
        };

        let orders: Vec<u32> = policy.ordered_steps().iter().map(|s| s.step_order).collect();
        assert_eq!(orders, vec![1, 2, 3]);
    }

    #[test]
    fn test_notification_policy_matching() {
        let mut policy = NotificationPolicy {
            policy_id: "np-1".to_string(),
            min_severity: Some(Severity::Minor),
            node_type_filter: vec!["router".to_string()],
            ..Default::default()
        };

        let router = Alarm::new("a", "d", "n", "x", Severity::Major).with_attribute("nodeType", "router");
        let untyped = Alarm::new("b", "d", "n", "x", Severity::Major);
        let info = Alarm::new("c", "d", "n", "x", Severity::Info).with_attribute("nodeType", "router");

        assert!(policy.matches(&router, WriteAction::Create));
        assert!(!policy.matches(&untyped, WriteAction::Create));
        assert!(!policy.matches(&info, WriteAction::Create));
        assert!(!policy.matches(&router, WriteAction::Replace));

        policy.notify_on_state_change = true;
        assert!(policy.matches(&router, WriteAction::PartialUpdate));
        assert_eq!(policy.cooldown_key("a"), "a:np-1");
    }

    #[test]
    fn test_channel_names() {
        let channel: NotificationChannel = serde_json::from_str(r#""pager_duty""#).unwrap();
        assert_eq!(channel, NotificationChannel::Pagerduty);
        assert_eq!(NotificationChannel::Slack.to_string(), "slack");
    }
}
