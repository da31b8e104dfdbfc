//! Alarm write path: hook orchestration, required fields and field protection.

pub mod hooks;
pub mod validation;

pub use hooks::{AlarmHooks, LifecycleHooks};
pub use validation::{assign_alarm_id, protect_fields, validate_required};

use crate::error::{AppError, Result};
use crate::models::{Alarm, AlarmPatch, WriteAction};
use crate::state::{seed::is_json, EntityStore};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// One alarm write
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WriteRequest {
    Create { alarm: Alarm },
    Replace { alarm: Alarm },
    PartialUpdate { alarm_id: String, patch: AlarmPatch },
}

impl WriteRequest {
    pub fn action(&self) -> WriteAction {
        match self {
            WriteRequest::Create { .. } => WriteAction::Create,
            WriteRequest::Replace { .. } => WriteAction::Replace,
            WriteRequest::PartialUpdate { .. } => WriteAction::PartialUpdate,
        }
    }
}

/// Load a replay file of write requests; `.json` is parsed as JSON, anything else as YAML
pub fn load_requests(path: &Path) -> Result<Vec<WriteRequest>> {
    let raw = std::fs::read_to_string(path)?;

    let requests = if is_json(path) {
        serde_json::from_str(&raw)?
    } else {
        serde_yaml::from_str(&raw)?
    };

    Ok(requests)
}

/// Runs writes through before-hooks, validation, persistence and after-hooks
pub struct AlarmLifecycle {
    store: Arc<dyn EntityStore>,
    hooks: Arc<dyn LifecycleHooks>,
}

impl AlarmLifecycle {
    pub fn new(store: Arc<dyn EntityStore>, hooks: Arc<dyn LifecycleHooks>) -> Self {
        Self { store, hooks }
    }

    /// Apply a write and return the alarm as left by the hooks.
    ///
    /// Validation and field-protection errors reject the write before
    /// persistence. Other hook failures are logged, not returned.
    pub async fn write(&self, request: WriteRequest) -> Result<Alarm> {
        let action = request.action();

        let mut alarm = match request {
            WriteRequest::Create { mut alarm } => {
                assign_alarm_id(&mut alarm, action);
                alarm
            }
            WriteRequest::Replace { alarm } => {
                if let Some(existing) = self.store.get_alarm(&alarm.alarm_id).await? {
                    protect_fields(&existing, &alarm)?;
                }
                alarm
            }
            WriteRequest::PartialUpdate { alarm_id, patch } => {
                let mut existing = self
                    .store
                    .get_alarm(&alarm_id)
                    .await?
                    .ok_or_else(|| AppError::NotFound(format!("Alarm {} not found", alarm_id)))?;
                existing.apply_patch(&patch);
                existing
            }
        };

        match self.hooks.before_write(&mut alarm, action).await {
            Ok(true) => {}
            Ok(false) => {
                debug!(alarm_id = %alarm.alarm_id, action = %action, "Write skipped by hook");
                return Ok(alarm);
            }
            Err(e) if e.is_write_fatal() => return Err(e),
            Err(e) => {
                warn!(alarm_id = %alarm.alarm_id, action = %action, error = %e, "Before-write hook failed");
            }
        }

        validate_required(&alarm)?;

        self.store.save_alarm(&alarm).await?;
        debug!(alarm_id = %alarm.alarm_id, action = %action, "Alarm persisted");

        if let Err(e) = self.hooks.after_write(&mut alarm, action).await {
            warn!(alarm_id = %alarm.alarm_id, action = %action, error = %e, "After-write hook failed");
        }

        Ok(alarm)
    }
}
