pub mod clock;
pub mod config;
pub mod correlation;
pub mod error;
pub mod escalation;
pub mod lifecycle;
pub mod maintenance;
pub mod metrics;
pub mod models;
pub mod notifications;
pub mod state;
pub mod topology;

pub use error::{AppError, Result};
