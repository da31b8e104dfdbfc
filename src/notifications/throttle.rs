use crate::models::NotificationPolicy;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Why a notification was held back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrottleDecision {
    Allow,
    Cooldown,
    HourlyCap,
}

impl ThrottleDecision {
    pub fn as_label(&self) -> &'static str {
        match self {
            ThrottleDecision::Allow => "allow",
            ThrottleDecision::Cooldown => "cooldown",
            ThrottleDecision::HourlyCap => "hourly_cap",
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct HourlyCounter {
    /// Hours since the unix epoch
    hour: i64,
    count: u32,
}

/// Per-alarm cooldown and per-policy hourly quota bookkeeping
#[derive(Debug, Default)]
pub struct ThrottleState {
    /// `alarmId:policyId` -> last send time
    last_sent: HashMap<String, DateTime<Utc>>,

    /// policy ID -> sends in the current hour bucket
    hourly: HashMap<String, HourlyCounter>,
}

impl ThrottleState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check both limits and, when allowed, record the send
    pub fn check_and_record(
        &mut self,
        alarm_id: &str,
        policy: &NotificationPolicy,
        now: DateTime<Utc>,
    ) -> ThrottleDecision {
        let key = policy.cooldown_key(alarm_id);

        if policy.cooldown_seconds > 0 {
            if let Some(last) = self.last_sent.get(&key) {
                let elapsed = now.timestamp() - last.timestamp();
                if elapsed < policy.cooldown_seconds as i64 {
                    return ThrottleDecision::Cooldown;
                }
            }
        }

        if policy.max_notifications_per_hour > 0 {
            let hour = now.timestamp().div_euclid(3600);
            let counter = self
                .hourly
                .entry(policy.policy_id.clone())
                .or_insert(HourlyCounter { hour, count: 0 });

            if counter.hour != hour {
                *counter = HourlyCounter { hour, count: 0 };
            }

            if counter.count >= policy.max_notifications_per_hour {
                return ThrottleDecision::HourlyCap;
            }

            counter.count += 1;
        }

        self.last_sent.insert(key, now);
        ThrottleDecision::Allow
    }

    /// Sends recorded for the policy in the bucket containing `now`
    pub fn hourly_count(&self, policy_id: &str, now: DateTime<Utc>) -> u32 {
        let hour = now.timestamp().div_euclid(3600);
        self.hourly
            .get(policy_id)
            .filter(|c| c.hour == hour)
            .map_or(0, |c| c.count)
    }
}
