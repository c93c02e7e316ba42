pub mod osm;
pub mod semantic;

pub use self::osm::{DanglingReference, Node, OsmId, OsmMapData, Way, WayTags};
pub use self::semantic::{MapCoords, PriorityTier, Road, SemanticMap};
