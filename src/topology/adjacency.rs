use crate::models::{LinkDirection, Topology};
use std::collections::HashMap;

/// Node ID to directly connected neighbor node IDs
pub type Adjacency = HashMap<String, Vec<String>>;

/// Build the node adjacency map for a topology from its link list.
///
/// Links with either endpoint missing are ignored. Neighbor lists keep link
/// order (links are iterated sorted by link ID).
pub fn build_adjacency(topology: &Topology) -> Adjacency {
    let mut adjacency = Adjacency::new();

    for link in topology.links.values() {
        if link.aside.is_empty() || link.zside.is_empty() {
            tracing::debug!(
                topology_id = %topology.topology_id,
                link_id = %link.link_id,
                "Skipping link with missing endpoint"
            );
            continue;
        }

        match link.direction {
            LinkDirection::AToZ => add_edge(&mut adjacency, &link.aside, &link.zside),
            LinkDirection::ZToA => add_edge(&mut adjacency, &link.zside, &link.aside),
            LinkDirection::Bidirectional | LinkDirection::Unspecified => {
                add_edge(&mut adjacency, &link.aside, &link.zside);
                add_edge(&mut adjacency, &link.zside, &link.aside);
            }
        }
    }

    adjacency
}

/// Append every neighbor list of `other` onto `into`
pub fn merge_adjacency(into: &mut Adjacency, other: Adjacency) {
    for (node, neighbors) in other {
        into.entry(node).or_default().extend(neighbors);
    }
}

fn add_edge(adjacency: &mut Adjacency, from: &str, to: &str) {
    adjacency
        .entry(from.to_string())
        .or_default()
        .push(to.to_string());
}
