use crate::error::{AppError, Result};
use crate::models::{Topology, TopologyMetadata};
use crate::topology::adjacency::{build_adjacency, merge_adjacency, Adjacency};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

/// Source of discovered topologies
#[async_trait]
pub trait TopologyProvider: Send + Sync {
    /// List the topologies currently published
    async fn list_topologies(&self) -> Result<Vec<TopologyMetadata>>;

    /// Fetch one topology with its links
    async fn get_topology(&self, topology_id: &str) -> Result<Topology>;
}

/// Topology provider backed by an in-process map
#[derive(Clone, Default)]
pub struct InMemoryTopologyProvider {
    topologies: Arc<DashMap<String, Topology>>,
}

impl InMemoryTopologyProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_topologies(topologies: impl IntoIterator<Item = Topology>) -> Self {
        let provider = Self::new();
        for topology in topologies {
            provider.put(topology);
        }
        provider
    }

    pub fn put(&self, topology: Topology) {
        self.topologies
            .insert(topology.topology_id.clone(), topology);
    }

    pub fn is_empty(&self) -> bool {
        self.topologies.is_empty()
    }
}

#[async_trait]
impl TopologyProvider for InMemoryTopologyProvider {
    async fn list_topologies(&self) -> Result<Vec<TopologyMetadata>> {
        let mut list: Vec<TopologyMetadata> = self
            .topologies
            .iter()
            .map(|entry| entry.metadata())
            .collect();
        list.sort_by(|a, b| a.topology_id.cmp(&b.topology_id));
        Ok(list)
    }

    async fn get_topology(&self, topology_id: &str) -> Result<Topology> {
        self.topologies
            .get(topology_id)
            .map(|entry| entry.clone())
            .ok_or_else(|| AppError::NotFound(format!("Topology {} not found", topology_id)))
    }
}

/// Union the adjacency of every topology the provider publishes.
///
/// Never fails: a missing provider or a failed listing gives an empty map, a
/// topology that cannot be fetched is skipped.
pub async fn fetch_adjacency(provider: Option<&dyn TopologyProvider>) -> Adjacency {
    let mut adjacency = Adjacency::new();

    let Some(provider) = provider else {
        return adjacency;
    };

    let topologies = match provider.list_topologies().await {
        Ok(list) => list,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to list topologies, continuing without adjacency");
            return adjacency;
        }
    };

    for meta in topologies {
        match provider.get_topology(&meta.topology_id).await {
            Ok(topology) => merge_adjacency(&mut adjacency, build_adjacency(&topology)),
            Err(e) => {
                tracing::warn!(
                    topology_id = %meta.topology_id,
                    error = %e,
                    "Failed to fetch topology, skipping"
                );
            }
        }
    }

    adjacency
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LinkDirection;

    struct BrokenProvider;

    #[async_trait]
    impl TopologyProvider for BrokenProvider {
        async fn list_topologies(&self) -> Result<Vec<TopologyMetadata>> {
            Ok(vec![TopologyMetadata {
                topology_id: "gone".to_string(),
                name: String::new(),
            }])
        }

        async fn get_topology(&self, topology_id: &str) -> Result<Topology> {
            Err(AppError::Network(format!("{} unreachable", topology_id)))
        }
    }

    #[tokio::test]
    async fn test_union_across_topologies() {
        let mut core = Topology::new("core");
        core.add_link("l-1", "r1", "r2", LinkDirection::Bidirectional);
        let mut access = Topology::new("access");
        access.add_link("l-2", "r1", "sw1", LinkDirection::Bidirectional);

        let provider = InMemoryTopologyProvider::with_topologies([core, access]);
        let adjacency = fetch_adjacency(Some(&provider)).await;

        let mut r1 = adjacency["r1"].clone();
        r1.sort();
        assert_eq!(r1, vec!["r2", "sw1"]);
    }

    #[tokio::test]
    async fn test_missing_or_broken_provider_gives_empty_map() {
        assert!(fetch_adjacency(None).await.is_empty());
        assert!(fetch_adjacency(Some(&BrokenProvider)).await.is_empty());
    }
}
