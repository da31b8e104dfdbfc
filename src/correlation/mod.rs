//! Root-cause correlation: pluggable strategies selected per rule type,
//! priority-ordered rule evaluation and symptom linkage.

pub mod conditions;
pub mod engine;
pub mod service;
pub mod strategy;

pub use conditions::{condition_matches, conditions_match};
pub use engine::CorrelationEngine;
pub use service::CorrelationService;
pub use strategy::{
    CompositeStrategy, CorrelationContext, CorrelationStrategy, PatternStrategy,
    TemporalStrategy, TopologicalStrategy,
};
