use std::collections::HashMap;

use super::osm::{Node, OsmId};

/// Importance class of a road. Ordered from least to most important, which is also the
/// draw order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PriorityTier {
    Lowest,
    Low,
    Medium,
    High,
    Highest,
}

impl PriorityTier {
    pub const ALL: [PriorityTier; 5] = [
        PriorityTier::Lowest,
        PriorityTier::Low,
        PriorityTier::Medium,
        PriorityTier::High,
        PriorityTier::Highest,
    ];

    /// Position of the tier along the gradient: 0.0 for `Lowest`, 1.0 for `Highest`.
    pub fn rank(self) -> f64 {
        self as u8 as f64 / (Self::ALL.len() - 1) as f64
    }

    pub fn name(self) -> &'static str {
        match self {
            PriorityTier::Lowest => "lowest",
            PriorityTier::Low => "low",
            PriorityTier::Medium => "medium",
            PriorityTier::High => "high",
            PriorityTier::Highest => "highest",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapCoords {
    pub lat: f64,
    pub lon: f64,
}

impl From<&Node> for MapCoords {
    fn from(value: &Node) -> Self {
        MapCoords {
            lat: value.lat,
            lon: value.lon,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Road {
    pub way_id: OsmId,
    pub name: Option<String>,
    /// Raw `highway` value as found in the export.
    pub highway: String,
    pub tier: PriorityTier,
    pub node_ids: Vec<OsmId>,
}

/// Roads picked out of an export, together with the nodes they reference.
#[derive(Debug, Default, Clone)]
pub struct SemanticMap {
    /// Roads in document order.
    pub roads: Vec<Road>,
    pub nodes: HashMap<OsmId, MapCoords>,
    pub non_road_ways: usize,
}

impl SemanticMap {
    /// Coordinates of a road's nodes, in way order.
    pub fn road_coords<'a>(&'a self, road: &'a Road) -> impl Iterator<Item = MapCoords> + 'a {
        road.node_ids.iter().filter_map(|id| self.nodes.get(id).copied())
    }
}
