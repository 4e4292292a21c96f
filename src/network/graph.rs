//! Directed road multigraph.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use super::geo::{haversine_km, BoundingBox, Coordinate};
use super::NetworkError;
use crate::vehicle::RoadRestrictions;

pub type NodeId = String;
pub type NodeIndex = usize;
pub type EdgeIndex = usize;

/// Speed assumed when a row carries no usable speed limit.
pub const DEFAULT_SPEED_KMH: f64 = 50.0;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum RoadType {
    Motorway,
    Trunk,
    Primary,
    Secondary,
    Tertiary,
    Residential,
    Service,
    Cycleway,
    Path,
    #[default]
    Unknown,
}

impl RoadType {
    pub fn as_str(self) -> &'static str {
        match self {
            RoadType::Motorway => "motorway",
            RoadType::Trunk => "trunk",
            RoadType::Primary => "primary",
            RoadType::Secondary => "secondary",
            RoadType::Tertiary => "tertiary",
            RoadType::Residential => "residential",
            RoadType::Service => "service",
            RoadType::Cycleway => "cycleway",
            RoadType::Path => "path",
            RoadType::Unknown => "unknown",
        }
    }

    pub fn is_highway(self) -> bool {
        matches!(self, RoadType::Motorway | RoadType::Trunk)
    }

    /// Classify an OSM `highway` value. Link roads share their parent class.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim().to_ascii_lowercase();
        match raw.strip_suffix("_link").unwrap_or(&raw) {
            "motorway" => RoadType::Motorway,
            "trunk" => RoadType::Trunk,
            "primary" => RoadType::Primary,
            "secondary" => RoadType::Secondary,
            "tertiary" => RoadType::Tertiary,
            "residential" => RoadType::Residential,
            "service" => RoadType::Service,
            "cycleway" => RoadType::Cycleway,
            "path" => RoadType::Path,
            _ => RoadType::Unknown,
        }
    }
}

impl From<String> for RoadType {
    fn from(raw: String) -> Self {
        RoadType::parse(&raw)
    }
}

impl fmt::Display for RoadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A routable intersection or point on the network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub lat: f64,
    pub lng: f64,
    #[serde(default = "default_node_type")]
    pub node_type: String,
    #[serde(default)]
    pub name: Option<String>,
}

fn default_node_type() -> String {
    "intersection".to_string()
}

impl Node {
    pub fn new(id: impl Into<NodeId>, lat: f64, lng: f64) -> Self {
        Self {
            id: id.into(),
            lat,
            lng,
            node_type: default_node_type(),
            name: None,
        }
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lng)
    }
}

/// An external edge row as delivered by a network provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeRow {
    pub id: String,
    pub source: NodeId,
    pub target: NodeId,
    pub length_m: f64,
    #[serde(default)]
    pub speed_limit_kmh: Option<f64>,
    #[serde(default)]
    pub road_type: RoadType,
    #[serde(default)]
    pub one_way: bool,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

impl EdgeRow {
    pub fn new(
        id: impl Into<String>,
        source: impl Into<NodeId>,
        target: impl Into<NodeId>,
        length_m: f64,
        road_type: RoadType,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            length_m,
            speed_limit_kmh: None,
            road_type,
            one_way: false,
            name: None,
            tags: BTreeMap::new(),
        }
    }

    pub fn one_way(mut self) -> Self {
        self.one_way = true;
        self
    }

    pub fn with_speed(mut self, speed_kmh: f64) -> Self {
        self.speed_limit_kmh = Some(speed_kmh);
        self
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Raw node and edge rows for a region.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkRows {
    pub nodes: Vec<Node>,
    pub edges: Vec<EdgeRow>,
}

/// A directed edge between two node indices.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    /// Id of the row this edge was built from. Both directions of a two-way
    /// row share it.
    pub id: String,
    pub source: NodeIndex,
    pub target: NodeIndex,
    pub length_m: f64,
    pub speed_kmh: f64,
    pub road_type: RoadType,
    pub one_way: bool,
    pub name: Option<String>,
    pub tags: BTreeMap<String, String>,
    /// Search weight assigned by the cost model.
    pub weight: f64,
}

impl Edge {
    pub fn length_km(&self) -> f64 {
        self.length_m / 1000.0
    }

    pub fn travel_time_minutes(&self) -> f64 {
        self.length_km() / self.speed_kmh * 60.0
    }

    pub fn restrictions(&self) -> RoadRestrictions {
        RoadRestrictions::from_tags(&self.tags)
    }

    /// Human readable label for diagnostics.
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => format!("{name} ({})", self.road_type),
            None => format!("edge {} ({})", self.id, self.road_type),
        }
    }
}

/// A directed multigraph of nodes and weighted edges.
#[derive(Debug, Clone, Default)]
pub struct RoadNetwork {
    nodes: Vec<Node>,
    node_index: HashMap<NodeId, NodeIndex>,
    edges: Vec<Edge>,
    outgoing: Vec<Vec<EdgeIndex>>,
    incoming: Vec<Vec<EdgeIndex>>,
}

impl RoadNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a network from provider rows.
    ///
    /// Two-way rows produce a pair of directed edges with identical
    /// attributes.
    pub fn from_rows(rows: &NetworkRows) -> Result<Self, NetworkError> {
        let mut network = Self::new();
        for node in &rows.nodes {
            network.add_node(node.clone())?;
        }
        for row in &rows.edges {
            network.add_row(row)?;
        }
        Ok(network)
    }

    /// Insert a node, replacing the attributes of an existing node with the
    /// same id.
    pub fn add_node(&mut self, node: Node) -> Result<NodeIndex, NetworkError> {
        if !node.coordinate().is_valid() {
            return Err(NetworkError::InvalidNode { node: node.id });
        }
        if let Some(&idx) = self.node_index.get(&node.id) {
            self.nodes[idx] = node;
            return Ok(idx);
        }
        let idx = self.nodes.len();
        self.node_index.insert(node.id.clone(), idx);
        self.nodes.push(node);
        self.outgoing.push(Vec::new());
        self.incoming.push(Vec::new());
        Ok(idx)
    }

    /// Insert one row, expanding two-way rows into both directions.
    pub fn add_row(&mut self, row: &EdgeRow) -> Result<(), NetworkError> {
        if !row.length_m.is_finite() || row.length_m < 0.0 {
            return Err(NetworkError::InvalidEdge {
                edge: row.id.clone(),
                reason: format!("length {} is not a non-negative number", row.length_m),
            });
        }
        let lookup = |id: &NodeId| {
            self.node_index
                .get(id)
                .copied()
                .ok_or_else(|| NetworkError::UnknownNode {
                    edge: row.id.clone(),
                    node: id.clone(),
                })
        };
        let source = lookup(&row.source)?;
        let target = lookup(&row.target)?;
        let speed_kmh = row
            .speed_limit_kmh
            .filter(|s| s.is_finite() && *s > 0.0)
            .unwrap_or(DEFAULT_SPEED_KMH);

        let edge = Edge {
            id: row.id.clone(),
            source,
            target,
            length_m: row.length_m,
            speed_kmh,
            road_type: row.road_type,
            one_way: row.one_way,
            name: row.name.clone(),
            tags: row.tags.clone(),
            weight: row.length_m / 1000.0,
        };
        if !row.one_way {
            let reverse = Edge {
                source: target,
                target: source,
                ..edge.clone()
            };
            self.push_edge(edge);
            self.push_edge(reverse);
        } else {
            self.push_edge(edge);
        }
        Ok(())
    }

    fn push_edge(&mut self, edge: Edge) -> EdgeIndex {
        let idx = self.edges.len();
        self.outgoing[edge.source].push(idx);
        self.incoming[edge.target].push(idx);
        self.edges.push(edge);
        idx
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node(&self, idx: NodeIndex) -> &Node {
        &self.nodes[idx]
    }

    pub fn edge(&self, idx: EdgeIndex) -> &Edge {
        &self.edges[idx]
    }

    pub fn index_of(&self, id: &str) -> Option<NodeIndex> {
        self.node_index.get(id).copied()
    }

    pub fn outgoing(&self, idx: NodeIndex) -> &[EdgeIndex] {
        &self.outgoing[idx]
    }

    pub fn incoming(&self, idx: NodeIndex) -> &[EdgeIndex] {
        &self.incoming[idx]
    }

    /// All edges leading directly from `from` to `to`.
    pub fn edges_between(&self, from: NodeIndex, to: NodeIndex) -> impl Iterator<Item = &Edge> {
        self.outgoing[from]
            .iter()
            .map(move |&e| &self.edges[e])
            .filter(move |e| e.target == to)
    }

    /// Closest node to a coordinate by planar distance in degrees.
    ///
    /// This is a linear scan; a spatial index would be needed for large
    /// regions.
    pub fn nearest_node(&self, at: Coordinate) -> Option<NodeIndex> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(idx, n)| {
                let dlat = n.lat - at.lat;
                let dlng = n.lng - at.lng;
                (idx, dlat * dlat + dlng * dlng)
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(idx, _)| idx)
    }

    /// Great-circle distance between two nodes in kilometers.
    pub fn geodesic_km(&self, a: NodeIndex, b: NodeIndex) -> f64 {
        haversine_km(self.nodes[a].coordinate(), self.nodes[b].coordinate())
    }

    /// Copy of this network with every edge weight recomputed.
    pub fn map_weights(&self, mut weight: impl FnMut(&Edge) -> f64) -> RoadNetwork {
        let mut copy = self.clone();
        for edge in &mut copy.edges {
            edge.weight = weight(edge);
        }
        copy
    }

    /// Copy of this network keeping only edges accepted by `keep` and the
    /// nodes they touch.
    pub fn retain_edges(&self, mut keep: impl FnMut(&Edge) -> bool) -> RoadNetwork {
        let kept: Vec<&Edge> = self.edges.iter().filter(|e| keep(e)).collect();
        let mut used = vec![false; self.nodes.len()];
        for e in &kept {
            used[e.source] = true;
            used[e.target] = true;
        }

        let mut network = RoadNetwork::new();
        let mut remap = vec![usize::MAX; self.nodes.len()];
        for (old, node) in self.nodes.iter().enumerate() {
            if used[old] {
                remap[old] = network.nodes.len();
                network.node_index.insert(node.id.clone(), network.nodes.len());
                network.nodes.push(node.clone());
                network.outgoing.push(Vec::new());
                network.incoming.push(Vec::new());
            }
        }
        for e in kept {
            network.push_edge(Edge {
                source: remap[e.source],
                target: remap[e.target],
                ..e.clone()
            });
        }
        network
    }

    /// Rows for the part of the network inside `bbox`. Edges are included
    /// when both endpoints lie inside.
    pub fn rows_within(&self, bbox: &BoundingBox) -> NetworkRows {
        let inside: Vec<bool> = self
            .nodes
            .iter()
            .map(|n| bbox.contains(n.coordinate()))
            .collect();
        let nodes = self
            .nodes
            .iter()
            .zip(&inside)
            .filter(|(_, keep)| **keep)
            .map(|(n, _)| n.clone())
            .collect();
        let edges = self
            .edges
            .iter()
            .filter(|e| inside[e.source] && inside[e.target])
            .map(|e| EdgeRow {
                id: e.id.clone(),
                source: self.nodes[e.source].id.clone(),
                target: self.nodes[e.target].id.clone(),
                length_m: e.length_m,
                speed_limit_kmh: Some(e.speed_kmh),
                road_type: e.road_type,
                one_way: true,
                name: e.name.clone(),
                tags: e.tags.clone(),
            })
            .collect();
        NetworkRows { nodes, edges }
    }

    /// Rough heap footprint in bytes, used by size-bounded caches.
    pub fn estimated_size_bytes(&self) -> usize {
        let node_bytes: usize = self
            .nodes
            .iter()
            .map(|n| std::mem::size_of::<Node>() + n.id.len() * 2 + n.node_type.len() + 16)
            .sum();
        let edge_bytes: usize = self
            .edges
            .iter()
            .map(|e| {
                std::mem::size_of::<Edge>()
                    + e.id.len()
                    + e.tags.iter().map(|(k, v)| k.len() + v.len() + 48).sum::<usize>()
                    + 2 * std::mem::size_of::<EdgeIndex>()
            })
            .sum();
        node_bytes + edge_bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows() -> NetworkRows {
        NetworkRows {
            nodes: vec![
                Node::new("a", 0.0, 0.0),
                Node::new("b", 0.0, 0.01),
                Node::new("c", 0.01, 0.01),
            ],
            edges: vec![
                EdgeRow::new("ab", "a", "b", 1113.0, RoadType::Primary),
                EdgeRow::new("bc", "b", "c", 1113.0, RoadType::Residential).one_way(),
            ],
        }
    }

    #[test]
    fn test_two_way_rows_produce_two_edges() {
        let network = RoadNetwork::from_rows(&rows()).unwrap();
        assert_eq!(network.node_count(), 3);
        assert_eq!(network.edge_count(), 3);

        let a = network.index_of("a").unwrap();
        let b = network.index_of("b").unwrap();
        let c = network.index_of("c").unwrap();
        assert_eq!(network.edges_between(a, b).count(), 1);
        assert_eq!(network.edges_between(b, a).count(), 1);
        assert_eq!(network.edges_between(b, c).count(), 1);
        assert_eq!(network.edges_between(c, b).count(), 0);
    }

    #[test]
    fn test_unknown_node_is_an_error() {
        let mut bad = rows();
        bad.edges.push(EdgeRow::new("cx", "c", "x", 10.0, RoadType::Service));
        let err = RoadNetwork::from_rows(&bad).unwrap_err();
        assert_eq!(
            err,
            NetworkError::UnknownNode {
                edge: "cx".into(),
                node: "x".into()
            }
        );
    }

    #[test]
    fn test_negative_length_is_rejected() {
        let mut bad = rows();
        bad.edges[0].length_m = -5.0;
        assert!(matches!(
            RoadNetwork::from_rows(&bad),
            Err(NetworkError::InvalidEdge { .. })
        ));
    }

    #[test]
    fn test_missing_speed_defaults() {
        let network = RoadNetwork::from_rows(&rows()).unwrap();
        assert!(network.edges().iter().all(|e| e.speed_kmh == DEFAULT_SPEED_KMH));
    }

    #[test]
    fn test_parallel_edges_are_preserved() {
        let mut r = rows();
        r.edges.push(EdgeRow::new("ab2", "a", "b", 2000.0, RoadType::Motorway).one_way());
        let network = RoadNetwork::from_rows(&r).unwrap();
        let a = network.index_of("a").unwrap();
        let b = network.index_of("b").unwrap();
        assert_eq!(network.edges_between(a, b).count(), 2);
    }

    #[test]
    fn test_nearest_node() {
        let network = RoadNetwork::from_rows(&rows()).unwrap();
        let idx = network.nearest_node(Coordinate::new(0.009, 0.011)).unwrap();
        assert_eq!(network.node(idx).id, "c");
        assert!(RoadNetwork::new().nearest_node(Coordinate::new(0.0, 0.0)).is_none());
    }

    #[test]
    fn test_retain_edges_drops_isolated_nodes() {
        let network = RoadNetwork::from_rows(&rows()).unwrap();
        let primary_only = network.retain_edges(|e| e.road_type == RoadType::Primary);
        assert_eq!(primary_only.node_count(), 2);
        assert_eq!(primary_only.edge_count(), 2);
        assert!(primary_only.index_of("c").is_none());
        assert_eq!(network.edge_count(), 3);
    }

    #[test]
    fn test_road_type_parsing() {
        assert_eq!(RoadType::parse("motorway_link"), RoadType::Motorway);
        assert_eq!(RoadType::parse("Primary"), RoadType::Primary);
        assert_eq!(RoadType::parse("bridleway"), RoadType::Unknown);
        let parsed: RoadType = serde_json::from_str("\"living_street\"").unwrap();
        assert_eq!(parsed, RoadType::Unknown);
    }

    #[test]
    fn test_rows_within_bbox() {
        let network = RoadNetwork::from_rows(&rows()).unwrap();
        let bbox = BoundingBox {
            min_lat: -0.001,
            min_lng: -0.001,
            max_lat: 0.001,
            max_lng: 0.011,
        };
        let region = network.rows_within(&bbox);
        assert_eq!(region.nodes.len(), 2);
        assert_eq!(region.edges.len(), 2);
        let rebuilt = RoadNetwork::from_rows(&region).unwrap();
        assert_eq!(rebuilt.edge_count(), 2);
    }
}
