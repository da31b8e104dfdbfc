use crate::escalation::state::{EscalationEntry, EscalationStatus};
use crate::metrics::{ESCALATIONS_CANCELLED_TOTAL, ESCALATION_STEPS_FIRED_TOTAL};
use crate::models::{Alarm, AlarmState, EscalationStep, PolicyStatus};
use crate::notifications::{render_template, Dispatcher};
use crate::state::EntityStore;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

/// Runs one cancelable chain of timed escalation steps per alarm
#[derive(Clone)]
pub struct EscalationScheduler {
    inner: Arc<Inner>,
}

struct Inner {
    store: Arc<dyn EntityStore>,
    dispatcher: Arc<Dispatcher>,
    entries: Mutex<HashMap<String, EscalationEntry>>,
    generations: AtomicU64,
}

/// A step armed under the lock, waiting for its timer task
struct Armed {
    generation: u64,
    cancel_rx: oneshot::Receiver<()>,
}

/// Everything a timer task needs to fire its step and arm the next one
struct Chain {
    alarm: Alarm,
    policy_id: String,
    steps: Arc<Vec<EscalationStep>>,
}

impl EscalationScheduler {
    pub fn new(store: Arc<dyn EntityStore>, dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                dispatcher,
                entries: Mutex::new(HashMap::new()),
                generations: AtomicU64::new(0),
            }),
        }
    }

    /// Start escalating an ACTIVE alarm under the first matching ACTIVE policy.
    ///
    /// Replaces any escalation already running for the alarm. Returns whether
    /// a chain was started.
    pub async fn schedule(&self, alarm: &Alarm) -> bool {
        if alarm.state != AlarmState::Active {
            return false;
        }

        let policies = match self
            .inner
            .store
            .list_escalation_policies(PolicyStatus::Active)
            .await
        {
            Ok(policies) => policies,
            Err(e) => {
                warn!(alarm_id = %alarm.alarm_id, error = %e, "Failed to load escalation policies");
                return false;
            }
        };

        let Some(policy) = policies
            .iter()
            .find(|p| !p.steps.is_empty() && p.matches(alarm))
        else {
            debug!(alarm_id = %alarm.alarm_id, "No escalation policy matches");
            return false;
        };

        info!(
            alarm_id = %alarm.alarm_id,
            policy_id = %policy.policy_id,
            steps = policy.steps.len(),
            "Escalation scheduled"
        );

        let chain = Chain {
            alarm: alarm.clone(),
            policy_id: policy.policy_id.clone(),
            steps: Arc::new(policy.ordered_steps()),
        };

        let armed = {
            let mut entries = self.inner.entries.lock();
            self.arm(&mut entries, &chain, 0)
        };
        self.spawn_timer(chain, 0, armed);

        true
    }

    /// Stop the alarm's escalation when it was acknowledged, cleared or suppressed
    pub fn handle_state_change(&self, alarm: &Alarm) -> bool {
        match alarm.state {
            AlarmState::Acknowledged | AlarmState::Cleared | AlarmState::Suppressed => {
                self.cancel(&alarm.alarm_id)
            }
            AlarmState::Active => false,
        }
    }

    /// Cancel the alarm's escalation; no further step fires once this returns.
    /// A step already dispatching is not interrupted.
    pub fn cancel(&self, alarm_id: &str) -> bool {
        let Some(entry) = self.inner.entries.lock().remove(alarm_id) else {
            return false;
        };

        let step = entry.step_index;
        let stopped_timer = entry.cancel();
        ESCALATIONS_CANCELLED_TOTAL.inc();

        info!(
            alarm_id = %alarm_id,
            step = step,
            in_flight = !stopped_timer,
            "Escalation cancelled"
        );
        true
    }

    pub fn active_escalation(&self, alarm_id: &str) -> Option<EscalationStatus> {
        self.inner
            .entries
            .lock()
            .get(alarm_id)
            .map(|entry| entry.status(alarm_id))
    }

    /// Number of alarms with a live escalation
    pub fn active_count(&self) -> usize {
        self.inner.entries.lock().len()
    }

    /// Record a new entry for step `index`, cancelling whatever was there
    fn arm(
        &self,
        entries: &mut HashMap<String, EscalationEntry>,
        chain: &Chain,
        index: usize,
    ) -> Armed {
        let (cancel_tx, cancel_rx) = oneshot::channel();
        let generation = self.inner.generations.fetch_add(1, Ordering::SeqCst);

        let previous = entries.insert(
            chain.alarm.alarm_id.clone(),
            EscalationEntry {
                policy_id: chain.policy_id.clone(),
                step_index: index,
                generation,
                firing: false,
                cancel: Some(cancel_tx),
            },
        );

        if let Some(previous) = previous {
            debug!(
                alarm_id = %chain.alarm.alarm_id,
                step = previous.step_index,
                "Replacing running escalation"
            );
            previous.cancel();
        }

        Armed {
            generation,
            cancel_rx,
        }
    }

    fn spawn_timer(&self, chain: Chain, index: usize, armed: Armed) {
        let delay_minutes = chain.steps[index].delay_minutes;
        let delay = Duration::from_secs(u64::from(delay_minutes) * 60);
        let scheduler = self.clone();
        let Armed {
            generation,
            cancel_rx,
        } = armed;

        debug!(
            alarm_id = %chain.alarm.alarm_id,
            step = index,
            delay_minutes = delay_minutes,
            "Escalation step armed"
        );

        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {
                    scheduler.fire(chain, index, generation).await;
                }
                _ = cancel_rx => {}
            }
        });
    }

    async fn fire(&self, chain: Chain, index: usize, generation: u64) {
        let alarm_id = chain.alarm.alarm_id.clone();

        // Claim the step; a cancel or replacement that won the race owns the entry now
        {
            let mut entries = self.inner.entries.lock();
            match entries.get_mut(&alarm_id) {
                Some(entry) if entry.generation == generation => {
                    entry.firing = true;
                    entry.cancel = None;
                }
                _ => return,
            }
        }

        let step = &chain.steps[index];
        let message = escalation_message(step, &chain.alarm);

        ESCALATION_STEPS_FIRED_TOTAL.inc();
        info!(
            alarm_id = %alarm_id,
            policy_id = %chain.policy_id,
            step = step.step_order,
            channel = %step.channel,
            "Escalation step fired"
        );

        if let Err(e) = self
            .inner
            .dispatcher
            .dispatch(step.channel, &step.endpoint, &message)
            .await
        {
            error!(alarm_id = %alarm_id, step = step.step_order, error = %e, "Escalation dispatch failed");
        }

        let next = {
            let mut entries = self.inner.entries.lock();
            let current = entries
                .get(&alarm_id)
                .is_some_and(|entry| entry.generation == generation);

            if !current {
                None
            } else if index + 1 < chain.steps.len() {
                Some(self.arm(&mut entries, &chain, index + 1))
            } else {
                entries.remove(&alarm_id);
                debug!(alarm_id = %alarm_id, "Escalation chain completed");
                None
            }
        };

        if let Some(armed) = next {
            self.spawn_timer(chain, index + 1, armed);
        }
    }
}

/// Rendered step template, or the default escalation text
pub fn escalation_message(step: &EscalationStep, alarm: &Alarm) -> String {
    if step.message_template.is_empty() {
        format!(
            "[ESCALATION] Alarm {} ({}) on {} - unacknowledged for {} minutes",
            alarm.alarm_id, alarm.name, alarm.node_name, step.delay_minutes
        )
    } else {
        render_template(&step.message_template, alarm)
    }
}
