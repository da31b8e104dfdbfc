use crate::error::{AppError, Result};
use crate::models::{
    Alarm, CorrelationRule, EscalationPolicy, MaintenanceWindow, NotificationPolicy, PolicyStatus,
    RuleStatus, WindowStatus,
};
use crate::state::{AlarmFilter, EntityStore, StoreSeed};
use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// In-memory entity store (for replays and testing)
///
/// Alarms are listed in insertion order; rules, policies and windows keep the
/// order they were first added in.
#[derive(Clone)]
pub struct InMemoryStore {
    alarms: Arc<DashMap<String, (u64, Alarm)>>,
    sequence: Arc<AtomicU64>,
    rules: Arc<RwLock<Vec<CorrelationRule>>>,
    escalation_policies: Arc<RwLock<Vec<EscalationPolicy>>>,
    notification_policies: Arc<RwLock<Vec<NotificationPolicy>>>,
    windows: Arc<RwLock<Vec<MaintenanceWindow>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            alarms: Arc::new(DashMap::new()),
            sequence: Arc::new(AtomicU64::new(0)),
            rules: Arc::new(RwLock::new(Vec::new())),
            escalation_policies: Arc::new(RwLock::new(Vec::new())),
            notification_policies: Arc::new(RwLock::new(Vec::new())),
            windows: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Build a store pre-populated from a seed document
    pub fn from_seed(seed: &StoreSeed) -> Self {
        let store = Self::new();

        for rule in &seed.correlation_rules {
            store.put_correlation_rule(rule.clone());
        }
        for policy in &seed.escalation_policies {
            store.put_escalation_policy(policy.clone());
        }
        for policy in &seed.notification_policies {
            store.put_notification_policy(policy.clone());
        }
        for window in &seed.maintenance_windows {
            store.put_maintenance_window(window.clone());
        }
        for alarm in &seed.alarms {
            store.insert_alarm(alarm.clone());
        }

        tracing::debug!(
            rules = seed.correlation_rules.len(),
            escalation_policies = seed.escalation_policies.len(),
            notification_policies = seed.notification_policies.len(),
            windows = seed.maintenance_windows.len(),
            alarms = seed.alarms.len(),
            "In-memory store seeded"
        );

        store
    }

    pub fn put_correlation_rule(&self, rule: CorrelationRule) {
        upsert(&self.rules, rule, |r| r.rule_id.clone());
    }

    pub fn put_escalation_policy(&self, policy: EscalationPolicy) {
        upsert(&self.escalation_policies, policy, |p| p.policy_id.clone());
    }

    pub fn put_notification_policy(&self, policy: NotificationPolicy) {
        upsert(&self.notification_policies, policy, |p| p.policy_id.clone());
    }

    pub fn put_maintenance_window(&self, window: MaintenanceWindow) {
        upsert(&self.windows, window, |w| w.window_id.clone());
    }

    /// Number of stored alarms
    pub fn alarm_count(&self) -> usize {
        self.alarms.len()
    }

    fn insert_alarm(&self, alarm: Alarm) {
        let seq = match self.alarms.get(&alarm.alarm_id) {
            Some(existing) => existing.0,
            None => self.sequence.fetch_add(1, Ordering::SeqCst),
        };
        self.alarms.insert(alarm.alarm_id.clone(), (seq, alarm));
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn upsert<T, F>(list: &RwLock<Vec<T>>, item: T, key: F)
where
    F: Fn(&T) -> String,
{
    let mut list = list.write();
    let id = key(&item);
    match list.iter_mut().find(|existing| key(existing) == id) {
        Some(slot) => *slot = item,
        None => list.push(item),
    }
}

#[async_trait]
impl EntityStore for InMemoryStore {
    async fn get_alarm(&self, alarm_id: &str) -> Result<Option<Alarm>> {
        Ok(self.alarms.get(alarm_id).map(|entry| entry.1.clone()))
    }

    async fn save_alarm(&self, alarm: &Alarm) -> Result<()> {
        self.insert_alarm(alarm.clone());
        tracing::debug!(alarm_id = %alarm.alarm_id, "Alarm saved");
        Ok(())
    }

    async fn update_alarm(&self, alarm: &Alarm) -> Result<()> {
        match self.alarms.get_mut(&alarm.alarm_id) {
            Some(mut entry) => {
                entry.1 = alarm.clone();
                tracing::debug!(alarm_id = %alarm.alarm_id, "Alarm updated");
                Ok(())
            }
            None => Err(AppError::NotFound(format!(
                "Alarm {} not found",
                alarm.alarm_id
            ))),
        }
    }

    async fn list_alarms(&self, filter: &AlarmFilter) -> Result<Vec<Alarm>> {
        let mut alarms: Vec<(u64, Alarm)> = self
            .alarms
            .iter()
            .filter(|entry| filter.matches(&entry.1))
            .map(|entry| entry.value().clone())
            .collect();

        alarms.sort_by_key(|(seq, _)| *seq);

        Ok(alarms.into_iter().map(|(_, alarm)| alarm).collect())
    }

    async fn list_correlation_rules(&self, status: RuleStatus) -> Result<Vec<CorrelationRule>> {
        Ok(self
            .rules
            .read()
            .iter()
            .filter(|r| r.status == status)
            .cloned()
            .collect())
    }

    async fn list_escalation_policies(
        &self,
        status: PolicyStatus,
    ) -> Result<Vec<EscalationPolicy>> {
        Ok(self
            .escalation_policies
            .read()
            .iter()
            .filter(|p| p.status == status)
            .cloned()
            .collect())
    }

    async fn list_notification_policies(
        &self,
        status: PolicyStatus,
    ) -> Result<Vec<NotificationPolicy>> {
        Ok(self
            .notification_policies
            .read()
            .iter()
            .filter(|p| p.status == status)
            .cloned()
            .collect())
    }

    async fn list_maintenance_windows(
        &self,
        status: WindowStatus,
    ) -> Result<Vec<MaintenanceWindow>> {
        Ok(self
            .windows
            .read()
            .iter()
            .filter(|w| w.status == status)
            .cloned()
            .collect())
    }
}
