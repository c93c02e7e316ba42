use std::collections::HashMap;

pub type OsmId = i64;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Node {
    pub id: OsmId,
    pub lat: f64,
    pub lon: f64,
}

/// The few way tags the renderer looks at. Everything else in the export is dropped
/// while parsing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WayTags {
    pub highway: Option<String>,
    pub name: Option<String>,
}

impl WayTags {
    pub const HIGHWAY: &'static str = "highway";
    pub const NAME: &'static str = "name";

    /// Stores `value` under `key` if the key is one we know, ignores it otherwise.
    pub fn set(&mut self, key: &str, value: String) {
        match key {
            Self::HIGHWAY => self.highway = Some(value),
            Self::NAME => self.name = Some(value),
            _ => (),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Way {
    pub id: OsmId,
    /// Node references in document order. Every id resolves in `OsmMapData::nodes`.
    pub node_ids: Vec<OsmId>,
    pub tags: WayTags,
}

/// A way that was dropped because it points at a node the export does not contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DanglingReference {
    pub way_id: OsmId,
    pub node_id: OsmId,
}

#[derive(Debug, Default, Clone)]
pub struct OsmMapData {
    pub nodes: HashMap<OsmId, Node>,
    /// Ways in document order.
    pub ways: Vec<Way>,
    pub dangling: Vec<DanglingReference>,
}
