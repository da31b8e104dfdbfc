use crate::models::{Alarm, AlarmState, CorrelationRule, CorrelationRuleType};
use crate::topology::Adjacency;
use regex::{Regex, RegexBuilder};
use std::collections::{HashMap, HashSet, VecDeque};

/// Inputs shared by every strategy for one correlation pass
#[derive(Debug, Clone, Default)]
pub struct CorrelationContext {
    /// Currently ACTIVE alarms, including the alarm being correlated
    pub active_alarms: Vec<Alarm>,

    /// Node adjacency; empty when no topology-based rule is active
    pub adjacency: Adjacency,
}

/// Trait for correlation strategies
pub trait CorrelationStrategy: Send + Sync {
    /// Propose a root-cause candidate for `alarm` under `rule`
    fn correlate<'a>(
        &self,
        alarm: &Alarm,
        rule: &CorrelationRule,
        ctx: &'a CorrelationContext,
    ) -> Option<&'a Alarm>;

    /// Get strategy name
    fn name(&self) -> &str;

    /// Rule type this strategy serves
    fn rule_type(&self) -> CorrelationRuleType;
}

/// Topological strategy - nearest qualifying alarm found by BFS over the adjacency map
pub struct TopologicalStrategy {
    default_depth: usize,
}

impl TopologicalStrategy {
    pub fn new(default_depth: usize) -> Self {
        Self { default_depth }
    }

    fn max_depth(&self, rule: &CorrelationRule) -> usize {
        if rule.traversal_depth > 0 {
            rule.traversal_depth as usize
        } else {
            self.default_depth
        }
    }

    /// Highest-severity live alarm per node, first seen on ties
    fn alarms_by_node<'a>(alarm: &Alarm, ctx: &'a CorrelationContext) -> HashMap<&'a str, &'a Alarm> {
        let mut by_node: HashMap<&'a str, &'a Alarm> = HashMap::new();

        for candidate in &ctx.active_alarms {
            if candidate.alarm_id == alarm.alarm_id
                || matches!(candidate.state, AlarmState::Cleared | AlarmState::Suppressed)
            {
                continue;
            }

            by_node
                .entry(candidate.node_id.as_str())
                .and_modify(|best| {
                    if candidate.severity > best.severity {
                        *best = candidate;
                    }
                })
                .or_insert(candidate);
        }

        by_node
    }

    fn is_root_candidate(candidate: &Alarm, symptom: &Alarm, rule: &CorrelationRule) -> bool {
        candidate.severity >= symptom.severity
            && (rule.root_node_types.is_empty()
                || node_type_matches(&rule.root_node_types, candidate))
    }
}

impl Default for TopologicalStrategy {
    fn default() -> Self {
        Self::new(5)
    }
}

impl CorrelationStrategy for TopologicalStrategy {
    fn correlate<'a>(
        &self,
        alarm: &Alarm,
        rule: &CorrelationRule,
        ctx: &'a CorrelationContext,
    ) -> Option<&'a Alarm> {
        if alarm.node_id.is_empty() || ctx.adjacency.is_empty() {
            return None;
        }

        if !rule.symptom_node_types.is_empty() && !node_type_matches(&rule.symptom_node_types, alarm)
        {
            return None;
        }

        let max_depth = self.max_depth(rule);
        let by_node = Self::alarms_by_node(alarm, ctx);

        let mut visited: HashSet<&str> = HashSet::new();
        visited.insert(alarm.node_id.as_str());
        let mut queue: VecDeque<(&str, usize)> = VecDeque::new();
        queue.push_back((alarm.node_id.as_str(), 0));

        while let Some((node, depth)) = queue.pop_front() {
            if depth >= max_depth {
                continue;
            }

            let Some(neighbors) = ctx.adjacency.get(node) else {
                continue;
            };

            for neighbor in neighbors {
                if !visited.insert(neighbor.as_str()) {
                    continue;
                }

                if let Some(candidate) = by_node.get(neighbor.as_str()) {
                    if Self::is_root_candidate(candidate, alarm, rule) {
                        return Some(*candidate);
                    }
                }

                queue.push_back((neighbor.as_str(), depth + 1));
            }
        }

        None
    }

    fn name(&self) -> &str {
        "topological"
    }

    fn rule_type(&self) -> CorrelationRuleType {
        CorrelationRuleType::Topological
    }
}

/// Temporal strategy - highest-severity alarm within the time window
pub struct TemporalStrategy;

impl TemporalStrategy {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TemporalStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl CorrelationStrategy for TemporalStrategy {
    fn correlate<'a>(
        &self,
        alarm: &Alarm,
        rule: &CorrelationRule,
        ctx: &'a CorrelationContext,
    ) -> Option<&'a Alarm> {
        if rule.time_window_seconds <= 0 {
            return None;
        }

        if !rule.symptom_alarm_pattern.is_empty() {
            let symptom = compile_pattern(&rule.symptom_alarm_pattern, rule)?;
            if !symptom.is_match(&alarm.name) {
                return None;
            }
        }

        let root = if rule.root_alarm_pattern.is_empty() {
            None
        } else {
            Some(compile_pattern(&rule.root_alarm_pattern, rule)?)
        };

        let alarm_time = alarm.occurrence_secs();

        highest_severity(ctx.active_alarms.iter().filter(|candidate| {
            is_peer(candidate, alarm)
                && within_window(alarm_time, candidate.occurrence_secs(), rule.time_window_seconds)
                && root.as_ref().map_or(true, |re| re.is_match(&candidate.name))
        }))
    }

    fn name(&self) -> &str {
        "temporal"
    }

    fn rule_type(&self) -> CorrelationRuleType {
        CorrelationRuleType::Temporal
    }
}

/// Pattern strategy - root and symptom recognised by alarm name
pub struct PatternStrategy;

impl PatternStrategy {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PatternStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl CorrelationStrategy for PatternStrategy {
    fn correlate<'a>(
        &self,
        alarm: &Alarm,
        rule: &CorrelationRule,
        ctx: &'a CorrelationContext,
    ) -> Option<&'a Alarm> {
        if rule.root_alarm_pattern.is_empty() || rule.symptom_alarm_pattern.is_empty() {
            return None;
        }

        let symptom = compile_pattern(&rule.symptom_alarm_pattern, rule)?;
        let root = compile_pattern(&rule.root_alarm_pattern, rule)?;

        if !symptom.is_match(&alarm.name) {
            return None;
        }

        highest_severity(
            ctx.active_alarms
                .iter()
                .filter(|candidate| is_peer(candidate, alarm) && root.is_match(&candidate.name)),
        )
    }

    fn name(&self) -> &str {
        "pattern"
    }

    fn rule_type(&self) -> CorrelationRuleType {
        CorrelationRuleType::Pattern
    }
}

/// Composite strategy - topological candidate, optionally also within the time window
pub struct CompositeStrategy {
    topological: TopologicalStrategy,
}

impl CompositeStrategy {
    pub fn new(topological: TopologicalStrategy) -> Self {
        Self { topological }
    }
}

impl CorrelationStrategy for CompositeStrategy {
    fn correlate<'a>(
        &self,
        alarm: &Alarm,
        rule: &CorrelationRule,
        ctx: &'a CorrelationContext,
    ) -> Option<&'a Alarm> {
        let candidate = self.topological.correlate(alarm, rule, ctx)?;

        if rule.time_window_seconds > 0
            && !within_window(
                alarm.occurrence_secs(),
                candidate.occurrence_secs(),
                rule.time_window_seconds,
            )
        {
            return None;
        }

        Some(candidate)
    }

    fn name(&self) -> &str {
        "composite"
    }

    fn rule_type(&self) -> CorrelationRuleType {
        CorrelationRuleType::Composite
    }
}

/// Node type filter: the alarm's node name or `nodeType` attribute is listed
fn node_type_matches(types: &[String], alarm: &Alarm) -> bool {
    if types.iter().any(|t| *t == alarm.node_name) {
        return true;
    }

    alarm
        .node_type()
        .is_some_and(|node_type| types.iter().any(|t| t == node_type))
}

/// Any other alarm that is not cleared
fn is_peer(candidate: &Alarm, alarm: &Alarm) -> bool {
    candidate.alarm_id != alarm.alarm_id && candidate.state != AlarmState::Cleared
}

fn within_window(a: i64, b: i64, window_secs: i64) -> bool {
    (a - b).abs() <= window_secs
}

/// Highest severity, keeping the first seen on ties
fn highest_severity<'a>(candidates: impl Iterator<Item = &'a Alarm>) -> Option<&'a Alarm> {
    candidates.fold(None, |best: Option<&'a Alarm>, candidate| match best {
        Some(b) if candidate.severity <= b.severity => Some(b),
        _ => Some(candidate),
    })
}

/// Compile a rule pattern, matched case-insensitively against alarm names.
/// An invalid pattern disables the rule for this pass.
fn compile_pattern(pattern: &str, rule: &CorrelationRule) -> Option<Regex> {
    match RegexBuilder::new(pattern).case_insensitive(true).build() {
        Ok(re) => Some(re),
        Err(e) => {
            tracing::warn!(
                rule_id = %rule.rule_id,
                pattern = %pattern,
                error = %e,
                "Invalid correlation pattern, rule does not match"
            );
            None
        }
    }
}
