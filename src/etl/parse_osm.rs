use std::collections::HashMap;
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::{self, FromStr};

use log::{debug, info, warn};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use xz::bufread::XzDecoder;

use crate::data::osm::{DanglingReference, Node, OsmId, OsmMapData, Way, WayTags};
use crate::errors::{Error, Result};

pub const ETL_NAME: &str = "parse_osm";

const NODE_PROGRESS_STEP: usize = 5000;
const WAY_PROGRESS_STEP: usize = 500;

/// Reads an export from disk. Files ending in `.xz` are decompressed on the fly.
pub fn parse_file(path: &Path, max_nodes: Option<usize>) -> Result<OsmMapData> {
    let file_reader = BufReader::new(fs::File::open(path)?);
    let is_xz = path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("xz"));
    if is_xz {
        let xz_reader = XzDecoder::new(file_reader);
        parse_reader(BufReader::new(xz_reader), max_nodes)
    } else {
        parse_reader(file_reader, max_nodes)
    }
}

pub fn parse_str(document: &str) -> Result<OsmMapData> {
    parse_reader(document.as_bytes(), None)
}

/// Reads the whole document in one pass. Nodes are buffered before way references are
/// resolved, so element order in the export does not matter.
pub fn parse_reader<R: BufRead>(source: R, max_nodes: Option<usize>) -> Result<OsmMapData> {
    let mut parser = OsmParser::new(max_nodes);
    let mut reader = Reader::from_reader(source);
    reader.trim_text(true);
    let mut buf = Vec::new();

    loop {
        let position = reader.buffer_position();
        match reader.read_event_into(&mut buf) {
            Err(e) => {
                return Err(Error::parse(format!("Malformed document at byte {}: {}", position, e)))
            },
            Ok(Event::Eof) => break,
            Ok(Event::Start(e)) => {
                parser.depth += 1;
                parser.handle_element(&e, position)?;
            },
            Ok(Event::Empty(e)) => {
                parser.handle_element(&e, position)?;
                if e.name().as_ref() == b"way" {
                    parser.finish_way();
                }
            },
            Ok(Event::End(e)) => {
                parser.depth = parser.depth.saturating_sub(1);
                match e.name().as_ref() {
                    b"way" => parser.finish_way(),
                    b"osm" if parser.depth == 0 => parser.root_closed = true,
                    _ => (),
                }
            },
            // Declarations, comments, <note> text and the like carry nothing we draw.
            Ok(_) => (),
        }
        // if we don't keep a borrow elsewhere, we can clear the buffer to keep memory usage low
        buf.clear();
    }

    parser.finish(reader.buffer_position())
}

struct OsmParser {
    max_nodes: Option<usize>,
    depth: usize,
    seen_root: bool,
    root_closed: bool,
    nodes: HashMap<OsmId, Node>,
    raw_ways: Vec<Way>,
    current_way: Option<Way>,
}

impl OsmParser {
    fn new(max_nodes: Option<usize>) -> Self {
        OsmParser {
            max_nodes,
            depth: 0,
            seen_root: false,
            root_closed: false,
            nodes: HashMap::new(),
            raw_ways: Vec::new(),
            current_way: None,
        }
    }

    fn handle_element(&mut self, el: &BytesStart, position: usize) -> Result<()> {
        let name = el.name();
        if self.root_closed {
            return Err(Error::parse(format!(
                "Unexpected <{}> after the closing </osm> at byte {}",
                String::from_utf8_lossy(name.as_ref()),
                position,
            )));
        }
        let is_root_level = self.depth <= 1;
        match name.as_ref() {
            b"osm" => {
                if self.seen_root || !is_root_level {
                    return Err(Error::parse(format!("Unexpected nested <osm> at byte {}", position)));
                }
                self.seen_root = true;
            },
            _ if !self.seen_root => {
                return Err(Error::parse(format!(
                    "Expected <osm> root element, found <{}> at byte {}",
                    String::from_utf8_lossy(name.as_ref()),
                    position,
                )));
            },
            b"node" => self.add_node(Self::parse_node(el, position)?)?,
            b"way" => {
                if self.current_way.is_some() {
                    return Err(Error::parse(format!("Nested <way> at byte {}", position)));
                }
                self.current_way = Some(Way {
                    id: required_attr(el, b"id", position)?,
                    node_ids: Vec::new(),
                    tags: WayTags::default(),
                });
            },
            b"nd" => {
                if let Some(way) = self.current_way.as_mut() {
                    way.node_ids.push(required_attr(el, b"ref", position)?);
                }
            },
            b"tag" => {
                if let Some(way) = self.current_way.as_mut() {
                    let key: String = required_attr(el, b"k", position)?;
                    let value: String = required_attr(el, b"v", position)?;
                    way.tags.set(&key, value);
                }
            },
            _ => (),
        }
        Ok(())
    }

    fn parse_node(el: &BytesStart, position: usize) -> Result<Node> {
        let mut id: Option<OsmId> = None;
        let mut lat: Option<f64> = None;
        let mut lon: Option<f64> = None;

        for attribute_res in el.attributes() {
            let attribute = attribute_res?;
            match attribute.key.as_ref() {
                b"id" => id = Some(parse_value(&attribute.unescape_value()?, "id", position)?),
                b"lat" => lat = Some(parse_value(&attribute.unescape_value()?, "lat", position)?),
                b"lon" => lon = Some(parse_value(&attribute.unescape_value()?, "lon", position)?),
                _ => (),
            }
        }

        let missing = |attr: &str| Error::parse(format!("<node> at byte {} has no '{}' attribute", position, attr));
        let node = Node {
            id: id.ok_or_else(|| missing("id"))?,
            lat: lat.ok_or_else(|| missing("lat"))?,
            lon: lon.ok_or_else(|| missing("lon"))?,
        };
        if !(-90.0..=90.0).contains(&node.lat) || !(-180.0..=180.0).contains(&node.lon) {
            return Err(Error::parse(format!(
                "Node {} has coordinates out of range ({}, {})",
                node.id, node.lat, node.lon
            )));
        }
        Ok(node)
    }

    fn add_node(&mut self, node: Node) -> Result<()> {
        if let Some(limit) = self.max_nodes {
            if self.nodes.len() >= limit && !self.nodes.contains_key(&node.id) {
                return Err(Error::parse(format!("Document exceeds the limit of {} nodes", limit)));
            }
        }
        self.nodes.insert(node.id, node);
        if self.nodes.len() % NODE_PROGRESS_STEP == 0 {
            debug!(etl_name = ETL_NAME, nodes = self.nodes.len(); "Collected nodes");
        }
        Ok(())
    }

    fn finish_way(&mut self) {
        if let Some(way) = self.current_way.take() {
            self.raw_ways.push(way);
            if self.raw_ways.len() % WAY_PROGRESS_STEP == 0 {
                debug!(etl_name = ETL_NAME, ways = self.raw_ways.len(); "Collected ways");
            }
        }
    }

    fn finish(self, position: usize) -> Result<OsmMapData> {
        if self.current_way.is_some() || self.depth != 0 {
            return Err(Error::parse(format!("Unexpected end of document at byte {}", position)));
        }
        if !self.seen_root {
            return Err(Error::parse("Document has no <osm> root element"));
        }

        let mut ways = Vec::with_capacity(self.raw_ways.len());
        let mut dangling = Vec::new();
        for way in self.raw_ways {
            match way.node_ids.iter().find(|id| !self.nodes.contains_key(id)) {
                Some(&node_id) => {
                    debug!(etl_name = ETL_NAME, way_id = way.id, node_id = node_id; "Dropping way with dangling node reference");
                    dangling.push(DanglingReference { way_id: way.id, node_id });
                },
                None => ways.push(way),
            }
        }

        if !dangling.is_empty() {
            warn!(etl_name = ETL_NAME, dropped = dangling.len(); "Dropped ways referencing nodes outside the export");
        }
        info!(etl_name = ETL_NAME, nodes = self.nodes.len(), ways = ways.len(); "Parsed document");

        Ok(OsmMapData {
            nodes: self.nodes,
            ways,
            dangling,
        })
    }
}

fn parse_value<T: FromStr>(value: &str, attr: &str, position: usize) -> Result<T> {
    value.trim().parse().map_err(|_| {
        Error::parse(format!("Invalid '{}' value '{}' at byte {}", attr, value, position))
    })
}

fn required_attr<T: FromStr>(el: &BytesStart, key: &[u8], position: usize) -> Result<T> {
    let key_str = str::from_utf8(key)?;
    for attribute_res in el.attributes() {
        let attribute = attribute_res?;
        if attribute.key.as_ref() == key {
            return parse_value(&attribute.unescape_value()?, key_str, position);
        }
    }
    Err(Error::parse(format!(
        "<{}> at byte {} has no '{}' attribute",
        String::from_utf8_lossy(el.name().as_ref()),
        position,
        key_str,
    )))
}
