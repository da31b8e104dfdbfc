use crate::models::Alarm;

/// Substitute `{{alarm.*}}` tokens; an empty template renders the default summary
pub fn render_template(template: &str, alarm: &Alarm) -> String {
    if template.is_empty() {
        return default_message(alarm);
    }

    let severity = alarm.severity.to_string();
    let state = alarm.state.to_string();

    [
        ("{{alarm.id}}", alarm.alarm_id.as_str()),
        ("{{alarm.name}}", alarm.name.as_str()),
        ("{{alarm.severity}}", severity.as_str()),
        ("{{alarm.state}}", state.as_str()),
        ("{{alarm.nodeId}}", alarm.node_id.as_str()),
        ("{{alarm.nodeName}}", alarm.node_name.as_str()),
        ("{{alarm.location}}", alarm.location.as_str()),
        ("{{alarm.description}}", alarm.description.as_str()),
    ]
    .into_iter()
    .fold(template.to_string(), |out, (token, value)| out.replace(token, value))
}

/// One-line alarm summary
pub fn default_message(alarm: &Alarm) -> String {
    format!(
        "Alarm {}: {} on {} (severity: {}, state: {})",
        alarm.alarm_id, alarm.name, alarm.node_name, alarm.severity, alarm.state
    )
}
