use serde::Serialize;
use tokio::sync::oneshot;

/// Live escalation of one alarm (process-local, never persisted)
#[derive(Debug)]
pub(crate) struct EscalationEntry {
    pub policy_id: String,

    /// Index into the policy's ordered steps
    pub step_index: usize,

    /// Distinguishes this arming from any earlier or later one for the alarm
    pub generation: u64,

    /// Set once the timer has fired and the step is being dispatched
    pub firing: bool,

    /// Signals the pending timer; `None` once firing
    pub cancel: Option<oneshot::Sender<()>>,
}

impl EscalationEntry {
    /// Stop the pending timer. Returns false when the step was already firing.
    pub fn cancel(mut self) -> bool {
        match self.cancel.take() {
            Some(tx) => {
                // The timer task may already be gone
                let _ = tx.send(());
                true
            }
            None => false,
        }
    }

    pub fn status(&self, alarm_id: &str) -> EscalationStatus {
        EscalationStatus {
            alarm_id: alarm_id.to_string(),
            policy_id: self.policy_id.clone(),
            step_index: self.step_index,
            firing: self.firing,
        }
    }
}

/// Snapshot of an alarm's escalation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EscalationStatus {
    pub alarm_id: String,
    pub policy_id: String,
    pub step_index: usize,
    pub firing: bool,
}
