use crate::correlation::engine::CorrelationEngine;
use crate::correlation::strategy::CorrelationContext;
use crate::models::{Alarm, RuleStatus};
use crate::state::{AlarmFilter, EntityStore};
use crate::topology::{fetch_adjacency, Adjacency, TopologyProvider};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Runs correlation for newly created alarms and writes the linkage back
pub struct CorrelationService {
    engine: Arc<CorrelationEngine>,
    store: Arc<dyn EntityStore>,
    topology: Option<Arc<dyn TopologyProvider>>,
}

impl CorrelationService {
    pub fn new(engine: Arc<CorrelationEngine>, store: Arc<dyn EntityStore>) -> Self {
        Self {
            engine,
            store,
            topology: None,
        }
    }

    pub fn with_topology(mut self, provider: Arc<dyn TopologyProvider>) -> Self {
        self.topology = Some(provider);
        self
    }

    /// Correlate a persisted alarm. Returns the updated root cause on success.
    ///
    /// Already-correlated and cleared alarms are left alone. Store failures
    /// end the pass without an error.
    pub async fn process(&self, alarm: &mut Alarm) -> Option<Alarm> {
        if alarm.is_correlated() || alarm.is_cleared() {
            debug!(alarm_id = %alarm.alarm_id, "Skipping correlation");
            return None;
        }

        let rules = match self.store.list_correlation_rules(RuleStatus::Active).await {
            Ok(rules) if rules.is_empty() => return None,
            Ok(rules) => rules,
            Err(e) => {
                warn!(alarm_id = %alarm.alarm_id, error = %e, "Failed to load correlation rules");
                return None;
            }
        };

        let active_alarms = match self.store.list_alarms(&AlarmFilter::active()).await {
            Ok(alarms) => alarms,
            Err(e) => {
                warn!(alarm_id = %alarm.alarm_id, error = %e, "Failed to load active alarms");
                return None;
            }
        };

        let adjacency = if rules.iter().any(|r| r.needs_topology()) {
            fetch_adjacency(self.topology.as_deref()).await
        } else {
            Adjacency::new()
        };

        let ctx = CorrelationContext {
            active_alarms,
            adjacency,
        };

        let root = self.engine.correlate(alarm, &rules, &ctx)?;

        if let Err(e) = self.store.update_alarm(alarm).await {
            error!(alarm_id = %alarm.alarm_id, error = %e, "Failed to save correlated symptom");
        }
        if let Err(e) = self.store.update_alarm(&root).await {
            error!(alarm_id = %root.alarm_id, error = %e, "Failed to save root cause alarm");
        }

        Some(root)
    }
}
