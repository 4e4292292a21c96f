//! In-memory network provider.

use std::path::Path;
use std::sync::Arc;

use arc_swap::ArcSwap;
use async_trait::async_trait;

use super::{NetworkProvider, ProviderError};
use crate::network::{BoundingBox, NetworkError, NetworkRows, RoadNetwork};

/// Serves regions cut from one network held in memory. The network can be
/// replaced while requests are in flight; readers keep the snapshot they
/// loaded.
pub struct StaticNetworkProvider {
    network: ArcSwap<RoadNetwork>,
}

impl StaticNetworkProvider {
    pub fn from_rows(rows: &NetworkRows) -> Result<Self, NetworkError> {
        Ok(Self {
            network: ArcSwap::from_pointee(RoadNetwork::from_rows(rows)?),
        })
    }

    /// Load `{"nodes": [...], "edges": [...]}` from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self, ProviderError> {
        let rows = read_rows(path)?;
        let provider =
            Self::from_rows(&rows).map_err(|e| ProviderError::Malformed(e.to_string()))?;
        let snapshot = provider.network.load();
        tracing::info!(
            path = %path.display(),
            nodes = snapshot.node_count(),
            edges = snapshot.edge_count(),
            "Loaded road network"
        );
        drop(snapshot);
        Ok(provider)
    }

    /// Swap in a new network.
    pub fn replace(&self, rows: &NetworkRows) -> Result<(), NetworkError> {
        let network = RoadNetwork::from_rows(rows)?;
        tracing::info!(
            nodes = network.node_count(),
            edges = network.edge_count(),
            "Replaced road network"
        );
        self.network.store(Arc::new(network));
        Ok(())
    }

    pub fn snapshot(&self) -> Arc<RoadNetwork> {
        self.network.load_full()
    }
}

fn read_rows(path: &Path) -> Result<NetworkRows, ProviderError> {
    let content = std::fs::read_to_string(path).map_err(|source| ProviderError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|e| ProviderError::Malformed(e.to_string()))
}

#[async_trait]
impl NetworkProvider for StaticNetworkProvider {
    async fn load_region(&self, bbox: &BoundingBox) -> Result<NetworkRows, ProviderError> {
        Ok(self.network.load().rows_within(bbox))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{Coordinate, EdgeRow, Node, RoadType};

    fn rows() -> NetworkRows {
        NetworkRows {
            nodes: vec![
                Node::new("a", 1.0, 1.0),
                Node::new("b", 1.001, 1.0),
                Node::new("far", 5.0, 5.0),
            ],
            edges: vec![
                EdgeRow::new("ab", "a", "b", 120.0, RoadType::Residential),
                EdgeRow::new("bf", "b", "far", 500_000.0, RoadType::Primary),
            ],
        }
    }

    #[tokio::test]
    async fn test_region_excludes_outside_nodes() {
        let provider = StaticNetworkProvider::from_rows(&rows()).unwrap();
        let bbox = BoundingBox::around(
            Coordinate::new(1.0, 1.0),
            Coordinate::new(1.001, 1.0),
            0.2,
            0.01,
        );
        let region = provider.load_region(&bbox).await.unwrap();
        assert_eq!(region.nodes.len(), 2);
        // The two-way row "ab" comes back as two directed rows.
        assert_eq!(region.edges.len(), 2);
        assert!(region.edges.iter().all(|e| e.id == "ab"));
    }

    #[tokio::test]
    async fn test_replace_swaps_snapshot() {
        let provider = StaticNetworkProvider::from_rows(&rows()).unwrap();
        let before = provider.snapshot();
        let mut smaller = rows();
        smaller.edges.pop();
        smaller.nodes.pop();
        provider.replace(&smaller).unwrap();
        assert_eq!(before.edge_count(), 4);
        assert_eq!(provider.snapshot().edge_count(), 2);
    }

    #[test]
    fn test_bad_rows_are_rejected() {
        let mut bad = rows();
        bad.edges.push(EdgeRow::new("x", "a", "ghost", 10.0, RoadType::Primary));
        assert!(StaticNetworkProvider::from_rows(&bad).is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = StaticNetworkProvider::from_json_file(Path::new("/no/such/network.json"))
            .err()
            .unwrap();
        assert!(matches!(err, ProviderError::Io { .. }));
    }
}
