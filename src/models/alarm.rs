use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strum::{Display, EnumString};
use validator::Validate;

/// Attribute key holding the node type of the alarming node
pub const ATTR_NODE_TYPE: &str = "nodeType";

/// Attribute key holding the alarm category
pub const ATTR_CATEGORY: &str = "category";

/// Represents an alarm raised against a network node or link
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
#[serde(default)]
pub struct Alarm {
    /// Unique identifier
    pub alarm_id: String,

    /// Alarm definition this alarm was raised from
    #[validate(length(min = 1, message = "DefinitionId is required"))]
    pub definition_id: String,

    /// Node the alarm was raised on
    #[validate(length(min = 1, message = "NodeId is required"))]
    pub node_id: String,

    pub node_name: String,
    pub link_id: String,
    pub location: String,
    pub source_identifier: String,
    pub event_id: String,
    pub dedup_key: String,

    /// Human-readable alarm name, matched by pattern rules
    pub name: String,
    pub description: String,

    /// Current lifecycle state
    pub state: AlarmState,

    /// Current severity
    pub severity: Severity,

    /// Severity the alarm was raised with
    pub original_severity: Severity,

    /// Root cause this alarm was linked to by the correlation engine
    pub root_cause_alarm_id: Option<String>,

    /// Rule that produced the root-cause link
    pub correlation_rule_id: Option<String>,

    pub is_root_cause: bool,

    /// Number of symptoms linked to this alarm
    pub symptom_count: u32,

    pub is_suppressed: bool,

    /// Root alarm ID or `maintenance:<windowId>`
    pub suppressed_by: Option<String>,

    pub first_occurrence: Option<DateTime<Utc>>,
    pub last_occurrence: Option<DateTime<Utc>>,

    /// Free-form attributes (`nodeType`, `category`, ...)
    pub attributes: HashMap<String, String>,
}

impl Default for Alarm {
    fn default() -> Self {
        Self {
            alarm_id: String::new(),
            definition_id: String::new(),
            node_id: String::new(),
            node_name: String::new(),
            link_id: String::new(),
            location: String::new(),
            source_identifier: String::new(),
            event_id: String::new(),
            dedup_key: String::new(),
            name: String::new(),
            description: String::new(),
            state: AlarmState::Active,
            severity: Severity::Info,
            original_severity: Severity::Info,
            root_cause_alarm_id: None,
            correlation_rule_id: None,
            is_root_cause: false,
            symptom_count: 0,
            is_suppressed: false,
            suppressed_by: None,
            first_occurrence: None,
            last_occurrence: None,
            attributes: HashMap::new(),
        }
    }
}

impl Alarm {
    /// Create a new active alarm
    pub fn new(
        alarm_id: impl Into<String>,
        definition_id: impl Into<String>,
        node_id: impl Into<String>,
        name: impl Into<String>,
        severity: Severity,
    ) -> Self {
        let now = Utc::now();

        Self {
            alarm_id: alarm_id.into(),
            definition_id: definition_id.into(),
            node_id: node_id.into(),
            name: name.into(),
            severity,
            original_severity: severity,
            first_occurrence: Some(now),
            last_occurrence: Some(now),
            ..Default::default()
        }
    }

    pub fn with_node_name(mut self, node_name: impl Into<String>) -> Self {
        self.node_name = node_name.into();
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    pub fn with_state(mut self, state: AlarmState) -> Self {
        self.state = state;
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_first_occurrence(mut self, at: DateTime<Utc>) -> Self {
        self.first_occurrence = Some(at);
        self
    }

    /// Node type from the `nodeType` attribute
    pub fn node_type(&self) -> Option<&str> {
        self.attributes.get(ATTR_NODE_TYPE).map(String::as_str)
    }

    /// Whether the correlation engine already linked this alarm to a root cause
    pub fn is_correlated(&self) -> bool {
        self.root_cause_alarm_id
            .as_deref()
            .is_some_and(|id| !id.is_empty())
    }

    pub fn is_cleared(&self) -> bool {
        self.state == AlarmState::Cleared
    }

    /// Occurrence time in unix seconds: first occurrence, falling back to the
    /// last occurrence, or zero when neither is known.
    pub fn occurrence_secs(&self) -> i64 {
        self.first_occurrence
            .or(self.last_occurrence)
            .map(|t| t.timestamp())
            .unwrap_or(0)
    }

    /// Suppress the alarm on behalf of `by`
    pub fn suppress(&mut self, by: impl Into<String>) {
        self.state = AlarmState::Suppressed;
        self.is_suppressed = true;
        self.suppressed_by = Some(by.into());
    }
}

/// Mutable alarm fields carried by a PARTIAL_UPDATE write
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AlarmPatch {
    pub state: Option<AlarmState>,
    pub severity: Option<Severity>,
    pub last_occurrence: Option<DateTime<Utc>>,

    /// Merged into the stored attributes
    pub attributes: HashMap<String, String>,
}

impl AlarmPatch {
    pub fn state(state: AlarmState) -> Self {
        Self {
            state: Some(state),
            ..Default::default()
        }
    }
}

impl Alarm {
    /// Apply a partial update; identity fields are never touched
    pub fn apply_patch(&mut self, patch: &AlarmPatch) {
        if let Some(state) = patch.state {
            self.state = state;
        }
        if let Some(severity) = patch.severity {
            self.severity = severity;
        }
        if let Some(at) = patch.last_occurrence {
            self.last_occurrence = Some(at);
        }
        self.attributes
            .extend(patch.attributes.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
}

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default, EnumString, Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AlarmState {
    #[default]
    Active,
    Acknowledged,
    Cleared,
    Suppressed,
}

/// Alarm severity, ordered from least to most severe
#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    EnumString,
    Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    #[default]
    Info,
    Warning,
    Minor,
    Major,
    Critical,
}

/// Kind of write the lifecycle hooks run around
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum WriteAction {
    Create,
    Replace,
    PartialUpdate,
}

impl WriteAction {
    /// REPLACE and PARTIAL_UPDATE are state changes of an existing alarm
    pub fn is_state_change(&self) -> bool {
        matches!(self, WriteAction::Replace | WriteAction::PartialUpdate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::str::FromStr;

    #[test]
    fn test_alarm_creation() {
        let alarm = Alarm::new("a-1", "def-1", "node-1", "linkDown", Severity::Major);

        assert_eq!(alarm.state, AlarmState::Active);
        assert_eq!(alarm.original_severity, Severity::Major);
        assert!(!alarm.is_correlated());
        assert!(alarm.validate().is_ok());
    }

    #[test]
    fn test_required_fields() {
        let alarm = Alarm::new("a-1", "", "", "linkDown", Severity::Major);
        let errors = alarm.validate().unwrap_err();
        let fields = errors.field_errors();

        assert!(fields.contains_key("definition_id"));
        assert!(fields.contains_key("node_id"));
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Critical > Severity::Major);
        assert!(Severity::Major > Severity::Minor);
        assert!(Severity::Warning > Severity::Info);
        assert_eq!(Severity::Critical.to_string(), "CRITICAL");
        assert_eq!(Severity::from_str("MINOR").unwrap(), Severity::Minor);
    }

    #[test]
    fn test_occurrence_fallback() {
        let last = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let mut alarm = Alarm::new("a-1", "def-1", "node-1", "x", Severity::Info);
        alarm.first_occurrence = None;
        alarm.last_occurrence = Some(last);
        assert_eq!(alarm.occurrence_secs(), last.timestamp());

        alarm.last_occurrence = None;
        assert_eq!(alarm.occurrence_secs(), 0);
    }

    #[test]
    fn test_empty_root_cause_is_not_correlated() {
        let mut alarm = Alarm::new("a-1", "def-1", "node-1", "x", Severity::Info);
        alarm.root_cause_alarm_id = Some(String::new());
        assert!(!alarm.is_correlated());

        alarm.root_cause_alarm_id = Some("root".to_string());
        assert!(alarm.is_correlated());
    }

    #[test]
    fn test_apply_patch() {
        let mut alarm = Alarm::new("a-1", "def-1", "node-1", "x", Severity::Minor);

        let mut patch = AlarmPatch::state(AlarmState::Acknowledged);
        patch.attributes.insert("ticket".to_string(), "INC-1".to_string());
        alarm.apply_patch(&patch);

        assert_eq!(alarm.state, AlarmState::Acknowledged);
        assert_eq!(alarm.alarm_id, "a-1");
        assert_eq!(alarm.severity, Severity::Minor);
        assert_eq!(alarm.attributes["ticket"], "INC-1");
    }

    #[test]
    fn test_partial_yaml_deserializes() {
        let alarm: Alarm = serde_yaml::from_str(
            "alarm_id: a-9\ndefinition_id: d\nnode_id: n\nseverity: CRITICAL\n",
        )
        .unwrap();
        assert_eq!(alarm.severity, Severity::Critical);
        assert_eq!(alarm.state, AlarmState::Active);
        assert!(alarm.attributes.is_empty());
    }
}
