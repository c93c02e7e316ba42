use std::collections::HashMap;

use log::{debug, info};

use crate::data::{
    osm::{OsmMapData, Way},
    semantic::{MapCoords, PriorityTier, Road, SemanticMap},
};

pub const ETL_NAME: &str = "semantic_map";

/// Maps a `highway` value to its tier. Unknown or missing values are `Lowest`, so an
/// exotic tag never ends up dominating the picture.
pub fn classify(highway: Option<&str>) -> PriorityTier {
    let Some(value) = highway else {
        return PriorityTier::Lowest;
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "motorway" | "motorway_link" | "trunk" | "trunk_link" => PriorityTier::Highest,
        "primary" | "primary_link" | "secondary" | "secondary_link" => PriorityTier::High,
        "tertiary" | "tertiary_link" | "residential" | "unclassified" | "busway" => PriorityTier::Medium,
        "service" | "pedestrian" | "cycleway" | "living_street" => PriorityTier::Low,
        _ => PriorityTier::Lowest,
    }
}

fn road_from_way(way: Way, highway: String) -> Road {
    Road {
        way_id: way.id,
        tier: classify(Some(&highway)),
        highway,
        name: way.tags.name,
        node_ids: way.node_ids,
    }
}

/// Keeps the ways tagged as roads and the nodes they use. Ways without a `highway`
/// tag (buildings, land use, ...) are counted and discarded.
pub fn build_semantic_map(input: OsmMapData) -> SemanticMap {
    let mut roads = Vec::new();
    let mut non_road_ways = 0;

    for mut way in input.ways {
        match way.tags.highway.take() {
            Some(highway) => roads.push(road_from_way(way, highway)),
            None => non_road_ways += 1,
        }
    }

    let mut nodes: HashMap<_, MapCoords> = HashMap::new();
    for road in &roads {
        for id in &road.node_ids {
            if let Some(node) = input.nodes.get(id) {
                nodes.entry(*id).or_insert_with(|| node.into());
            }
        }
    }

    for tier in PriorityTier::ALL {
        let count = roads.iter().filter(|road| road.tier == tier).count();
        debug!(etl_name = ETL_NAME, tier = tier.name(), roads = count; "Classified roads");
    }
    info!(etl_name = ETL_NAME, roads = roads.len(), non_road_ways = non_road_ways, nodes = nodes.len(); "Built road map");

    SemanticMap {
        roads,
        nodes,
        non_road_ways,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::osm::{Node, WayTags};

    #[test]
    fn classification_table() {
        let cases = [
            ("motorway", PriorityTier::Highest),
            ("trunk_link", PriorityTier::Highest),
            ("primary", PriorityTier::High),
            ("secondary_link", PriorityTier::High),
            ("tertiary", PriorityTier::Medium),
            ("residential", PriorityTier::Medium),
            ("unclassified", PriorityTier::Medium),
            ("service", PriorityTier::Low),
            ("pedestrian", PriorityTier::Low),
            ("cycleway", PriorityTier::Low),
            ("footway", PriorityTier::Lowest),
            ("path", PriorityTier::Lowest),
            ("steps", PriorityTier::Lowest),
        ];
        for (value, tier) in cases {
            assert_eq!(classify(Some(value)), tier, "{}", value);
        }
    }

    #[test]
    fn classification_ignores_case() {
        assert_eq!(classify(Some("MotorWay")), PriorityTier::Highest);
        assert_eq!(classify(Some("PRIMARY_LINK")), PriorityTier::High);
        assert_eq!(classify(Some(" Residential ")), PriorityTier::Medium);
    }

    #[test]
    fn unknown_or_missing_is_lowest() {
        assert_eq!(classify(None), PriorityTier::Lowest);
        assert_eq!(classify(Some("")), PriorityTier::Lowest);
        assert_eq!(classify(Some("proposed")), PriorityTier::Lowest);
        assert_eq!(classify(Some("raceway")), PriorityTier::Lowest);
    }

    #[test]
    fn keeps_only_highway_ways_and_their_nodes() {
        let mut data = OsmMapData::default();
        for (id, lat) in [(1, 0.0), (2, 1.0), (3, 2.0), (4, 3.0)] {
            data.nodes.insert(id, Node { id, lat, lon: 0.0 });
        }
        data.ways.push(Way {
            id: 100,
            node_ids: vec![1, 2],
            tags: WayTags { highway: Some("trunk".into()), name: Some("A1".into()) },
        });
        data.ways.push(Way {
            id: 101,
            node_ids: vec![3, 4],
            tags: WayTags { highway: None, name: Some("Town Hall".into()) },
        });

        let map = build_semantic_map(data);
        assert_eq!(map.roads.len(), 1);
        assert_eq!(map.non_road_ways, 1);
        let road = &map.roads[0];
        assert_eq!(road.tier, PriorityTier::Highest);
        assert_eq!(road.highway, "trunk");
        assert_eq!(road.name.as_deref(), Some("A1"));
        assert_eq!(map.nodes.len(), 2);
        assert!(!map.nodes.contains_key(&3));
        assert_eq!(map.road_coords(road).count(), 2);
    }
}
