use crate::error::{AppError, Result};
use crate::models::{Alarm, WriteAction};
use uuid::Uuid;
use validator::Validate;

/// Assign a UUID to a created alarm that arrived without an ID
pub fn assign_alarm_id(alarm: &mut Alarm, action: WriteAction) {
    if action == WriteAction::Create && alarm.alarm_id.is_empty() {
        alarm.alarm_id = Uuid::new_v4().to_string();
    }
}

/// AlarmId, DefinitionId and NodeId must be present
pub fn validate_required(alarm: &Alarm) -> Result<()> {
    if alarm.alarm_id.is_empty() {
        return Err(AppError::Validation("AlarmId is required".to_string()));
    }

    alarm.validate()?;
    Ok(())
}

/// Reject a replacement that changes an identity or origin field of the stored alarm
pub fn protect_fields(existing: &Alarm, incoming: &Alarm) -> Result<()> {
    let checks: [(&str, bool); 11] = [
        ("definitionId", existing.definition_id == incoming.definition_id),
        ("name", existing.name == incoming.name),
        ("description", existing.description == incoming.description),
        (
            "originalSeverity",
            existing.original_severity == incoming.original_severity,
        ),
        ("nodeId", existing.node_id == incoming.node_id),
        ("nodeName", existing.node_name == incoming.node_name),
        ("linkId", existing.link_id == incoming.link_id),
        ("location", existing.location == incoming.location),
        (
            "sourceIdentifier",
            existing.source_identifier == incoming.source_identifier,
        ),
        ("eventId", existing.event_id == incoming.event_id),
        ("dedupKey", existing.dedup_key == incoming.dedup_key),
    ];

    match checks.iter().find(|(_, unchanged)| !unchanged) {
        Some((field, _)) => Err(AppError::FieldProtected(field.to_string())),
        None => Ok(()),
    }
}
