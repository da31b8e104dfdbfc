use crate::models::{Alarm, AlarmState, Severity, Topology};
use std::collections::HashMap;

#[derive(Default)]
struct Tally {
    count: u32,
    highest: Option<Severity>,
}

impl Tally {
    fn add(&mut self, severity: Severity) {
        self.count += 1;
        self.highest = Some(self.highest.map_or(severity, |h| h.max(severity)));
    }
}

/// Overlay live alarm counts and highest severities onto a topology.
///
/// CLEARED and SUPPRESSED alarms are not counted. Nodes are matched by
/// `node_id`, links by `link_id`; entries without alarms are reset.
pub fn enrich_topology(topology: &mut Topology, alarms: &[Alarm]) {
    let mut by_node: HashMap<&str, Tally> = HashMap::new();
    let mut by_link: HashMap<&str, Tally> = HashMap::new();

    for alarm in alarms {
        if matches!(alarm.state, AlarmState::Cleared | AlarmState::Suppressed) {
            continue;
        }
        if !alarm.node_id.is_empty() {
            by_node.entry(alarm.node_id.as_str()).or_default().add(alarm.severity);
        }
        if !alarm.link_id.is_empty() {
            by_link.entry(alarm.link_id.as_str()).or_default().add(alarm.severity);
        }
    }

    for (node_id, node) in topology.nodes.iter_mut() {
        let tally = by_node.remove(node_id.as_str()).unwrap_or_default();
        node.alarm_count = tally.count;
        node.highest_alarm_severity = tally.highest;
    }

    for (link_id, link) in topology.links.iter_mut() {
        let tally = by_link.remove(link_id.as_str()).unwrap_or_default();
        link.alarm_count = tally.count;
        link.highest_alarm_severity = tally.highest;
    }
}
