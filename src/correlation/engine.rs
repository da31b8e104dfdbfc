use crate::config::CorrelationConfig;
use crate::correlation::conditions::conditions_match;
use crate::correlation::strategy::{
    CompositeStrategy, CorrelationContext, CorrelationStrategy, PatternStrategy,
    TemporalStrategy, TopologicalStrategy,
};
use crate::metrics::{ALARMS_SUPPRESSED_TOTAL, CORRELATIONS_TOTAL};
use crate::models::{Alarm, AlarmState, CorrelationRule, CorrelationRuleType};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Selects the first rule whose strategy proposes a root cause and links the
/// alarm to it
pub struct CorrelationEngine {
    /// Strategy registry keyed by rule type
    strategies: RwLock<HashMap<CorrelationRuleType, Arc<dyn CorrelationStrategy>>>,
}

impl CorrelationEngine {
    /// Create an engine with the four built-in strategies registered
    pub fn new(config: &CorrelationConfig) -> Self {
        let engine = Self::empty();

        engine.register(Arc::new(TopologicalStrategy::new(
            config.default_traversal_depth,
        )));
        engine.register(Arc::new(TemporalStrategy::new()));
        engine.register(Arc::new(PatternStrategy::new()));
        engine.register(Arc::new(CompositeStrategy::new(TopologicalStrategy::new(
            config.default_traversal_depth,
        ))));

        engine
    }

    /// Create an engine without any strategy
    pub fn empty() -> Self {
        Self {
            strategies: RwLock::new(HashMap::new()),
        }
    }

    /// Register a strategy, replacing any previous one for the same rule type
    pub fn register(&self, strategy: Arc<dyn CorrelationStrategy>) {
        debug!(strategy = strategy.name(), "Registering correlation strategy");
        self.strategies.write().insert(strategy.rule_type(), strategy);
    }

    pub fn has_strategy(&self, rule_type: CorrelationRuleType) -> bool {
        self.strategies.read().contains_key(&rule_type)
    }

    /// Correlate `alarm` against `rules`.
    ///
    /// Rules are tried in ascending priority; inactive rules are skipped. On
    /// the first success the alarm's link fields are set (plus auto-suppress
    /// and auto-acknowledge) and the updated root-cause alarm is returned.
    pub fn correlate(
        &self,
        alarm: &mut Alarm,
        rules: &[CorrelationRule],
        ctx: &CorrelationContext,
    ) -> Option<Alarm> {
        let mut ordered: Vec<&CorrelationRule> = rules.iter().filter(|r| r.is_active()).collect();
        ordered.sort_by_key(|r| r.priority);

        for rule in ordered {
            if !conditions_match(&rule.conditions, alarm) {
                debug!(alarm_id = %alarm.alarm_id, rule_id = %rule.rule_id, "Rule conditions not met");
                continue;
            }

            let strategy = match self.strategies.read().get(&rule.rule_type) {
                Some(strategy) => strategy.clone(),
                None => {
                    debug!(rule_id = %rule.rule_id, rule_type = %rule.rule_type, "No strategy registered");
                    continue;
                }
            };

            let Some(candidate) = strategy.correlate(alarm, rule, ctx) else {
                continue;
            };

            if rule.min_symptom_count > 0 && candidate.symptom_count + 1 < rule.min_symptom_count {
                debug!(
                    alarm_id = %alarm.alarm_id,
                    rule_id = %rule.rule_id,
                    root_id = %candidate.alarm_id,
                    symptom_count = candidate.symptom_count,
                    min_symptom_count = rule.min_symptom_count,
                    "Root candidate below minimum symptom count"
                );
                continue;
            }

            let mut root = candidate.clone();
            link(alarm, &mut root, rule);
            return Some(root);
        }

        None
    }
}

/// Apply the symptom/root linkage for a successful rule
fn link(alarm: &mut Alarm, root: &mut Alarm, rule: &CorrelationRule) {
    alarm.root_cause_alarm_id = Some(root.alarm_id.clone());
    alarm.correlation_rule_id = Some(rule.rule_id.clone());
    root.is_root_cause = true;
    root.symptom_count += 1;

    if rule.auto_suppress_symptoms {
        alarm.suppress(root.alarm_id.clone());
        ALARMS_SUPPRESSED_TOTAL
            .with_label_values(&["correlation"])
            .inc();
    }

    if rule.auto_acknowledge_symptoms && root.state == AlarmState::Acknowledged {
        alarm.state = AlarmState::Acknowledged;
    }

    CORRELATIONS_TOTAL
        .with_label_values(&[&rule.rule_type.to_string()])
        .inc();

    info!(
        alarm_id = %alarm.alarm_id,
        root_id = %root.alarm_id,
        rule_id = %rule.rule_id,
        rule_type = %rule.rule_type,
        symptom_count = root.symptom_count,
        "Alarm correlated to root cause"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ConditionOperator, CorrelationCondition, RuleStatus, Severity};
    use crate::topology::Adjacency;

    fn engine() -> CorrelationEngine {
        CorrelationEngine::new(&CorrelationConfig::default())
    }

    fn pattern_rule(id: &str, priority: i32, root: &str) -> CorrelationRule {
        let mut rule = CorrelationRule::new(id, CorrelationRuleType::Pattern, priority);
        rule.root_alarm_pattern = root.to_string();
        rule.symptom_alarm_pattern = "^tempAboveThreshold$".to_string();
        rule
    }

    fn context(alarms: Vec<Alarm>) -> CorrelationContext {
        CorrelationContext {
            active_alarms: alarms,
            adjacency: Adjacency::new(),
        }
    }

    #[test]
    fn test_default_strategies_registered() {
        let engine = engine();
        for rule_type in [
            CorrelationRuleType::Topological,
            CorrelationRuleType::Temporal,
            CorrelationRuleType::Pattern,
            CorrelationRuleType::Composite,
        ] {
            assert!(engine.has_strategy(rule_type));
        }
    }

    #[test]
    fn test_lower_priority_value_wins() {
        let psu = Alarm::new("psu", "d", "n1", "powerSupplyFailure", Severity::Critical);
        let fan = Alarm::new("fan", "d", "n2", "fanFailure", Severity::Critical);
        let mut symptom = Alarm::new("s", "d", "n3", "tempAboveThreshold", Severity::Major);
        let ctx = context(vec![psu, fan, symptom.clone()]);

        let rules = vec![pattern_rule("by-fan", 20, "^fan"), pattern_rule("by-psu", 10, "^power")];

        let root = engine().correlate(&mut symptom, &rules, &ctx).unwrap();
        assert_eq!(root.alarm_id, "psu");
        assert!(root.is_root_cause);
        assert_eq!(root.symptom_count, 1);
        assert_eq!(symptom.root_cause_alarm_id.as_deref(), Some("psu"));
        assert_eq!(symptom.correlation_rule_id.as_deref(), Some("by-psu"));
    }

    #[test]
    fn test_min_symptom_count_falls_through() {
        let psu = Alarm::new("psu", "d", "n1", "powerSupplyFailure", Severity::Critical);
        let mut fan = Alarm::new("fan", "d", "n2", "fanFailure", Severity::Critical);
        fan.symptom_count = 2;
        let mut symptom = Alarm::new("s", "d", "n3", "tempAboveThreshold", Severity::Major);
        let ctx = context(vec![psu, fan, symptom.clone()]);

        let mut first = pattern_rule("by-psu", 1, "^power");
        first.min_symptom_count = 3;
        let mut second = pattern_rule("by-fan", 2, "^fan");
        second.min_symptom_count = 3;

        let root = engine()
            .correlate(&mut symptom, &[first, second], &ctx)
            .unwrap();
        assert_eq!(root.alarm_id, "fan");
        assert_eq!(root.symptom_count, 3);
    }

    #[test]
    fn test_inactive_rules_and_conditions_skipped() {
        let psu = Alarm::new("psu", "d", "n1", "powerSupplyFailure", Severity::Critical);
        let mut symptom = Alarm::new("s", "d", "n3", "tempAboveThreshold", Severity::Major)
            .with_location("DC-West");
        let ctx = context(vec![psu, symptom.clone()]);

        let mut inactive = pattern_rule("off", 1, "^power");
        inactive.status = RuleStatus::Inactive;
        let mut scoped = pattern_rule("east-only", 2, "^power");
        scoped.conditions = vec![CorrelationCondition::new(
            "location",
            ConditionOperator::Equals,
            "DC-East",
        )];

        assert!(engine()
            .correlate(&mut symptom, &[inactive, scoped], &ctx)
            .is_none());
        assert!(!symptom.is_correlated());
    }

    #[test]
    fn test_auto_suppress_and_acknowledge() {
        let root = Alarm::new("psu", "d", "n1", "powerSupplyFailure", Severity::Critical)
            .with_state(AlarmState::Acknowledged);
        let mut symptom = Alarm::new("s", "d", "n3", "tempAboveThreshold", Severity::Major);

        let mut rule = pattern_rule("pwr", 1, "^power");
        rule.auto_acknowledge_symptoms = true;

        // Pattern candidates only need to be non-cleared
        let ctx = context(vec![root, symptom.clone()]);
        engine().correlate(&mut symptom, &[rule.clone()], &ctx).unwrap();
        assert_eq!(symptom.state, AlarmState::Acknowledged);
        assert!(!symptom.is_suppressed);

        let mut suppressed = Alarm::new("s2", "d", "n4", "tempAboveThreshold", Severity::Major);
        rule.auto_acknowledge_symptoms = false;
        rule.auto_suppress_symptoms = true;
        engine().correlate(&mut suppressed, &[rule], &ctx).unwrap();
        assert_eq!(suppressed.state, AlarmState::Suppressed);
        assert!(suppressed.is_suppressed);
        assert_eq!(suppressed.suppressed_by.as_deref(), Some("psu"));
    }

    #[test]
    fn test_unregistered_rule_type_is_skipped() {
        let engine = CorrelationEngine::empty();
        engine.register(Arc::new(PatternStrategy::new()));

        let psu = Alarm::new("psu", "d", "n1", "powerSupplyFailure", Severity::Critical);
        let mut symptom = Alarm::new("s", "d", "n3", "tempAboveThreshold", Severity::Major);
        let ctx = context(vec![psu, symptom.clone()]);

        let mut temporal = CorrelationRule::new("tmp", CorrelationRuleType::Temporal, 1);
        temporal.time_window_seconds = 600;
        let rules = vec![temporal, pattern_rule("pwr", 2, "^power")];

        let root = engine.correlate(&mut symptom, &rules, &ctx).unwrap();
        assert_eq!(symptom.correlation_rule_id.as_deref(), Some("pwr"));
        assert_eq!(root.alarm_id, "psu");
    }
}
