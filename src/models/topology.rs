use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::alarm::Severity;

/// Identifies one topology published by a topology service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TopologyMetadata {
    pub topology_id: String,
    #[serde(default)]
    pub name: String,
}

/// Discovered topology: nodes and the links between them
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Topology {
    pub topology_id: String,
    pub name: String,
    pub nodes: BTreeMap<String, TopologyNode>,
    pub links: BTreeMap<String, TopologyLink>,
}

impl Topology {
    pub fn new(topology_id: impl Into<String>) -> Self {
        Self {
            topology_id: topology_id.into(),
            ..Default::default()
        }
    }

    pub fn metadata(&self) -> TopologyMetadata {
        TopologyMetadata {
            topology_id: self.topology_id.clone(),
            name: self.name.clone(),
        }
    }

    pub fn add_node(&mut self, node_id: impl Into<String>, node_type: impl Into<String>) {
        let node_id = node_id.into();
        self.nodes.insert(
            node_id.clone(),
            TopologyNode {
                node_id,
                node_type: node_type.into(),
                ..Default::default()
            },
        );
    }

    pub fn add_link(
        &mut self,
        link_id: impl Into<String>,
        aside: impl Into<String>,
        zside: impl Into<String>,
        direction: LinkDirection,
    ) {
        let link_id = link_id.into();
        self.links.insert(
            link_id.clone(),
            TopologyLink {
                link_id,
                aside: aside.into(),
                zside: zside.into(),
                direction,
                ..Default::default()
            },
        );
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct TopologyNode {
    pub node_id: String,
    pub name: String,
    pub node_type: String,

    /// Overlay: number of live alarms on the node
    pub alarm_count: u32,

    /// Overlay: highest live alarm severity on the node
    pub highest_alarm_severity: Option<Severity>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct TopologyLink {
    pub link_id: String,
    pub aside: String,
    pub zside: String,
    pub direction: LinkDirection,
    pub alarm_count: u32,
    pub highest_alarm_severity: Option<Severity>,
}

/// Link direction; unspecified links are treated as bidirectional
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LinkDirection {
    #[default]
    Unspecified,
    Bidirectional,
    AToZ,
    ZToA,
}

impl LinkDirection {
    pub fn is_bidirectional(&self) -> bool {
        matches!(self, LinkDirection::Unspecified | LinkDirection::Bidirectional)
    }
}
