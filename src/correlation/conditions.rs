use crate::models::{Alarm, ConditionOperator, CorrelationCondition, ATTR_CATEGORY};
use std::borrow::Cow;

/// All conditions hold for the alarm (an empty list always holds)
pub fn conditions_match(conditions: &[CorrelationCondition], alarm: &Alarm) -> bool {
    conditions.iter().all(|c| condition_matches(c, alarm))
}

/// Evaluate one condition. Operators other than EQUALS, NOT_EQUALS and
/// CONTAINS are satisfied unconditionally.
pub fn condition_matches(condition: &CorrelationCondition, alarm: &Alarm) -> bool {
    let actual = field_value(alarm, &condition.field);

    match condition.operator {
        ConditionOperator::Equals => actual == condition.value,
        ConditionOperator::NotEquals => actual != condition.value,
        ConditionOperator::Contains => actual.contains(condition.value.as_str()),
        _ => true,
    }
}

/// Value of a named alarm field; unknown fields read as empty
fn field_value<'a>(alarm: &'a Alarm, field: &str) -> Cow<'a, str> {
    match field {
        "severity" => Cow::Owned(alarm.severity.to_string()),
        "state" => Cow::Owned(alarm.state.to_string()),
        "name" => Cow::Borrowed(&alarm.name),
        "nodeId" => Cow::Borrowed(&alarm.node_id),
        "nodeName" => Cow::Borrowed(&alarm.node_name),
        "location" => Cow::Borrowed(&alarm.location),
        "definitionId" => Cow::Borrowed(&alarm.definition_id),
        "category" => alarm
            .attributes
            .get(ATTR_CATEGORY)
            .map(|v| Cow::Borrowed(v.as_str()))
            .unwrap_or(Cow::Borrowed("")),
        _ => Cow::Borrowed(""),
    }
}
