use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Correlation rule deciding how a new alarm is linked to a root cause
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CorrelationRule {
    pub rule_id: String,
    pub name: String,
    pub description: String,

    /// Strategy used to find a root-cause candidate
    pub rule_type: CorrelationRuleType,

    pub status: RuleStatus,

    /// Evaluation order, lower values first
    pub priority: i32,

    /// Field predicates that must all hold for the rule to apply
    pub conditions: Vec<CorrelationCondition>,

    /// Maximum BFS hops for topological rules (non-positive means default)
    pub traversal_depth: i32,

    /// Temporal proximity window in seconds (non-positive disables the check)
    pub time_window_seconds: i64,

    /// Regex a root-cause candidate name must match
    pub root_alarm_pattern: String,

    /// Regex the symptom alarm name must match
    pub symptom_alarm_pattern: String,

    /// Minimum symptom count (including the new symptom) before linking
    pub min_symptom_count: u32,

    pub auto_suppress_symptoms: bool,
    pub auto_acknowledge_symptoms: bool,

    /// Allowed node types for the root-cause node
    pub root_node_types: Vec<String>,

    /// Allowed node types for the symptom node
    pub symptom_node_types: Vec<String>,
}

impl Default for CorrelationRule {
    fn default() -> Self {
        Self {
            rule_id: String::new(),
            name: String::new(),
            description: String::new(),
            rule_type: CorrelationRuleType::Topological,
            status: RuleStatus::Active,
            priority: 0,
            conditions: Vec::new(),
            traversal_depth: 0,
            time_window_seconds: 0,
            root_alarm_pattern: String::new(),
            symptom_alarm_pattern: String::new(),
            min_symptom_count: 0,
            auto_suppress_symptoms: false,
            auto_acknowledge_symptoms: false,
            root_node_types: Vec::new(),
            symptom_node_types: Vec::new(),
        }
    }
}

impl CorrelationRule {
    pub fn new(rule_id: impl Into<String>, rule_type: CorrelationRuleType, priority: i32) -> Self {
        let rule_id = rule_id.into();
        Self {
            name: rule_id.clone(),
            rule_id,
            rule_type,
            priority,
            ..Default::default()
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == RuleStatus::Active
    }

    /// Whether evaluating this rule needs the topology adjacency map
    pub fn needs_topology(&self) -> bool {
        matches!(
            self.rule_type,
            CorrelationRuleType::Topological | CorrelationRuleType::Composite
        )
    }
}

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, EnumString, Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum CorrelationRuleType {
    Topological,
    Temporal,
    Pattern,
    Composite,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleStatus {
    Draft,
    #[default]
    Active,
    #[serde(alias = "DISABLED")]
    Inactive,
}

/// A single field predicate of a correlation rule
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CorrelationCondition {
    /// One of severity, state, name, nodeId, nodeName, location, definitionId, category
    pub field: String,
    pub operator: ConditionOperator,
    #[serde(default)]
    pub value: String,
}

impl CorrelationCondition {
    pub fn new(field: impl Into<String>, operator: ConditionOperator, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }
}

/// Condition operators. Only EQUALS, NOT_EQUALS and CONTAINS are evaluated;
/// every other operator is treated as satisfied.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ConditionOperator {
    Equals,
    NotEquals,
    Contains,
    Regex,
    GreaterThan,
    LessThan,
    In,
    #[serde(other)]
    Unspecified,
}
