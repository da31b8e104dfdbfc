//! Topology adjacency consumed by topological correlation, plus the alarm
//! overlay shown on topology views.

mod adjacency;
mod overlay;
mod provider;

pub use adjacency::{build_adjacency, merge_adjacency, Adjacency};
pub use overlay::enrich_topology;
pub use provider::{fetch_adjacency, InMemoryTopologyProvider, TopologyProvider};
