pub mod scheduler;
pub mod state;

pub use scheduler::{escalation_message, EscalationScheduler};
pub use state::EscalationStatus;
