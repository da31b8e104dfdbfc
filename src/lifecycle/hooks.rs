use crate::clock::Clock;
use crate::config::Config;
use crate::correlation::{CorrelationEngine, CorrelationService};
use crate::error::Result;
use crate::escalation::EscalationScheduler;
use crate::maintenance::MaintenanceWindowChecker;
use crate::metrics::ALARMS_SUPPRESSED_TOTAL;
use crate::models::{Alarm, AlarmState, WriteAction};
use crate::notifications::{Dispatcher, NotificationEngine};
use crate::state::EntityStore;
use crate::topology::TopologyProvider;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

/// Hooks run around every alarm write
#[async_trait]
pub trait LifecycleHooks: Send + Sync {
    /// Runs before persistence; `Ok(false)` skips the write
    async fn before_write(&self, alarm: &mut Alarm, action: WriteAction) -> Result<bool>;

    /// Runs after persistence
    async fn after_write(&self, alarm: &mut Alarm, action: WriteAction) -> Result<()>;
}

/// The decision engines wired as lifecycle hooks: maintenance suppression
/// before the write, then correlation, notification and escalation after it
pub struct AlarmHooks {
    maintenance: Option<MaintenanceWindowChecker>,
    correlation: Option<CorrelationService>,
    notifications: Option<NotificationEngine>,
    escalation: Option<EscalationScheduler>,
}

impl AlarmHooks {
    /// Build every enabled engine over shared dependencies
    pub fn new(
        config: &Config,
        store: Arc<dyn EntityStore>,
        topology: Option<Arc<dyn TopologyProvider>>,
        dispatcher: Arc<Dispatcher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let maintenance = config
            .maintenance
            .enabled
            .then(|| MaintenanceWindowChecker::new(store.clone(), clock.clone()));

        let correlation = config.correlation.enabled.then(|| {
            let engine = Arc::new(CorrelationEngine::new(&config.correlation));
            let service = CorrelationService::new(engine, store.clone());
            match topology {
                Some(provider) => service.with_topology(provider),
                None => service,
            }
        });

        let notifications = config.notifications.enabled.then(|| {
            NotificationEngine::new(store.clone(), dispatcher.clone(), clock.clone())
        });

        let escalation = config
            .escalation
            .enabled
            .then(|| EscalationScheduler::new(store.clone(), dispatcher.clone()));

        Self {
            maintenance,
            correlation,
            notifications,
            escalation,
        }
    }

    pub fn escalation(&self) -> Option<&EscalationScheduler> {
        self.escalation.as_ref()
    }

    pub fn notifications(&self) -> Option<&NotificationEngine> {
        self.notifications.as_ref()
    }

    async fn suppress_notifications(&self, alarm: &Alarm) -> bool {
        match &self.maintenance {
            Some(checker) => checker.check(alarm).await.suppress_notifications,
            None => false,
        }
    }
}

#[async_trait]
impl LifecycleHooks for AlarmHooks {
    async fn before_write(&self, alarm: &mut Alarm, action: WriteAction) -> Result<bool> {
        if action != WriteAction::Create {
            return Ok(true);
        }

        let Some(checker) = &self.maintenance else {
            return Ok(true);
        };

        let result = checker.check(alarm).await;
        if result.in_window && result.suppress_alarms {
            if let Some(by) = result.suppressed_by() {
                info!(alarm_id = %alarm.alarm_id, suppressed_by = %by, "Alarm suppressed by maintenance window");
                alarm.suppress(by);
                ALARMS_SUPPRESSED_TOTAL
                    .with_label_values(&["maintenance"])
                    .inc();
            }
        }

        Ok(true)
    }

    async fn after_write(&self, alarm: &mut Alarm, action: WriteAction) -> Result<()> {
        if action == WriteAction::Create {
            if let Some(correlation) = &self.correlation {
                correlation.process(alarm).await;
            }
        }

        if let Some(notifications) = &self.notifications {
            if alarm.state == AlarmState::Suppressed {
                debug!(alarm_id = %alarm.alarm_id, "Suppressed alarm, skipping notifications");
            } else {
                let suppress = self.suppress_notifications(alarm).await;
                notifications.notify(alarm, action, suppress).await;
            }
        }

        if let Some(escalation) = &self.escalation {
            match action {
                WriteAction::Create => {
                    escalation.schedule(alarm).await;
                }
                WriteAction::Replace | WriteAction::PartialUpdate => {
                    escalation.handle_state_change(alarm);
                }
            }
        }

        Ok(())
    }
}
