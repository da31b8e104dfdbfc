use crate::error::{AppError, Result};
use crate::models::{
    Alarm, CorrelationRule, EscalationPolicy, MaintenanceWindow, NotificationPolicy, Topology,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Initial entities loaded into an [`InMemoryStore`](super::InMemoryStore)
/// and topology provider
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSeed {
    pub correlation_rules: Vec<CorrelationRule>,
    pub escalation_policies: Vec<EscalationPolicy>,
    pub notification_policies: Vec<NotificationPolicy>,
    pub maintenance_windows: Vec<MaintenanceWindow>,
    pub topologies: Vec<Topology>,
    pub alarms: Vec<Alarm>,
}

impl StoreSeed {
    /// Load a seed document; `.json` files are parsed as JSON, anything else as YAML
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;

        let seed = if is_json(path) {
            serde_json::from_str(&raw)?
        } else {
            serde_yaml::from_str(&raw)?
        };

        Ok(seed)
    }

    /// Fail on duplicate rule IDs, which would make priority order ambiguous
    pub fn check(&self) -> Result<()> {
        let mut seen = std::collections::HashSet::new();
        for rule in &self.correlation_rules {
            if !seen.insert(rule.rule_id.as_str()) {
                return Err(AppError::Validation(format!(
                    "duplicate correlation rule id {}",
                    rule.rule_id
                )));
            }
        }
        Ok(())
    }
}

pub(crate) fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}
