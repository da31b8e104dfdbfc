use crate::clock::Clock;
use crate::metrics::NOTIFICATIONS_THROTTLED_TOTAL;
use crate::models::{Alarm, NotificationPolicy, PolicyStatus, WriteAction};
use crate::notifications::sender::Dispatcher;
use crate::notifications::template::render_template;
use crate::notifications::throttle::{ThrottleDecision, ThrottleState};
use crate::state::EntityStore;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Policy-driven notifications with per-alarm cooldown and per-policy hourly cap
pub struct NotificationEngine {
    store: Arc<dyn EntityStore>,
    dispatcher: Arc<Dispatcher>,
    clock: Arc<dyn Clock>,
    throttle: Mutex<ThrottleState>,
}

impl NotificationEngine {
    pub fn new(
        store: Arc<dyn EntityStore>,
        dispatcher: Arc<Dispatcher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            dispatcher,
            clock,
            throttle: Mutex::new(ThrottleState::new()),
        }
    }

    /// Notify every matching policy's targets about a write of `alarm`.
    ///
    /// Returns the number of messages delivered. Nothing is sent when
    /// `suppress_notifications` is set; store and dispatch failures are logged.
    pub async fn notify(
        &self,
        alarm: &Alarm,
        action: WriteAction,
        suppress_notifications: bool,
    ) -> usize {
        if suppress_notifications {
            debug!(alarm_id = %alarm.alarm_id, "Notifications suppressed by maintenance window");
            return 0;
        }

        let policies = match self
            .store
            .list_notification_policies(PolicyStatus::Active)
            .await
        {
            Ok(policies) => policies,
            Err(e) => {
                warn!(alarm_id = %alarm.alarm_id, error = %e, "Failed to load notification policies");
                return 0;
            }
        };

        let mut delivered = 0;

        for policy in policies.iter().filter(|p| p.matches(alarm, action)) {
            if !self.admit(alarm, policy) {
                continue;
            }
            delivered += self.send_to_targets(alarm, policy).await;
        }

        delivered
    }

    /// Throttle check-and-record under the shared lock
    fn admit(&self, alarm: &Alarm, policy: &NotificationPolicy) -> bool {
        let now = self.clock.now();
        let decision = self
            .throttle
            .lock()
            .check_and_record(&alarm.alarm_id, policy, now);

        if decision == ThrottleDecision::Allow {
            return true;
        }

        NOTIFICATIONS_THROTTLED_TOTAL
            .with_label_values(&[decision.as_label()])
            .inc();
        debug!(
            alarm_id = %alarm.alarm_id,
            policy_id = %policy.policy_id,
            reason = decision.as_label(),
            "Notification throttled"
        );
        false
    }

    async fn send_to_targets(&self, alarm: &Alarm, policy: &NotificationPolicy) -> usize {
        let mut delivered = 0;

        for target in &policy.targets {
            let message = render_template(&target.template, alarm);

            // Failures are already logged by the dispatcher
            if self
                .dispatcher
                .dispatch(target.channel, &target.endpoint, &message)
                .await
                .is_ok()
            {
                delivered += 1;
                info!(
                    alarm_id = %alarm.alarm_id,
                    policy_id = %policy.policy_id,
                    channel = %target.channel,
                    "Notification sent"
                );
            }
        }

        delivered
    }

    /// Sends recorded for a policy in the current hour bucket
    pub fn hourly_count(&self, policy_id: &str) -> u32 {
        self.throttle.lock().hourly_count(policy_id, self.clock.now())
    }
}
