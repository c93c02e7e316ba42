//! The in-memory pipeline: parsed export in, SVG markup out.

use std::collections::HashMap;
use std::io::BufRead;

use log::{info, warn};

use crate::{
    bounds::BoundingRegion,
    config::RenderConfig,
    data::{osm::{OsmId, OsmMapData}, semantic::SemanticMap},
    errors::Result,
    etl::{draw_map::{self, Canvas, StyledRoad}, parse_osm, semantic_map},
    projection::{CanvasTransform, PlanarPoint, PlanarProjection},
};

/// What happened to the input on its way to the picture.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversionReport {
    pub nodes: usize,
    pub ways: usize,
    /// Ways dropped for referencing nodes missing from the export.
    pub dangling_ways: usize,
    /// Ways without a `highway` tag.
    pub non_road_ways: usize,
    pub roads: usize,
    /// Roads with fewer than two points, left out of the drawing.
    pub degenerate_roads: usize,
    /// Road nodes outside the fitted bounds, drawn past the canvas edge.
    pub clipped_points: usize,
    pub paths: usize,
    pub width: u32,
    pub height: u32,
}

impl ConversionReport {
    /// True when nothing got drawn. The document is still valid, showing at most the
    /// background.
    pub fn is_empty(&self) -> bool {
        self.paths == 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    pub svg: String,
    pub report: ConversionReport,
}

pub fn convert_reader<R: BufRead>(source: R, config: &RenderConfig) -> Result<Conversion> {
    config.validate()?;
    let data = parse_osm::parse_reader(source, config.max_nodes)?;
    render(data, config)
}

pub fn convert_str(document: &str, config: &RenderConfig) -> Result<Conversion> {
    convert_reader(document.as_bytes(), config)
}

/// Classifies, projects, styles and draws an already parsed export.
pub fn render(data: OsmMapData, config: &RenderConfig) -> Result<Conversion> {
    config.validate()?;
    let mut report = ConversionReport {
        nodes: data.nodes.len(),
        ways: data.ways.len() + data.dangling.len(),
        dangling_ways: data.dangling.len(),
        ..Default::default()
    };

    let SemanticMap { roads, nodes, non_road_ways } = semantic_map::build_semantic_map(data);
    report.non_road_ways = non_road_ways;
    report.roads = roads.len();

    // Sorted so the floating point sums below do not depend on hash order.
    let mut coords: Vec<_> = nodes.into_iter().collect();
    coords.sort_unstable_by_key(|(id, _)| *id);

    let projection = PlanarProjection::from_coords(coords.iter().map(|(_, c)| *c));
    let planar: Vec<(OsmId, PlanarPoint)> = coords
        .iter()
        .map(|(id, c)| (*id, projection.project(*c)))
        .collect();
    let points: Vec<PlanarPoint> = planar.iter().map(|(_, p)| *p).collect();
    let region = BoundingRegion::from_points(&points, config.clip_percentile)
        .unwrap_or(BoundingRegion::point(PlanarPoint { x: 0.0, y: 0.0 }));
    report.clipped_points = points.iter().filter(|p| !region.contains(**p)).count();
    let transform = CanvasTransform::fit(region, config.width, config.height, config.padding);
    info!(
        etl_name = "render",
        mean_latitude = projection.mean_latitude(),
        width = transform.canvas_width(),
        height = transform.canvas_height(),
        clip_percentile = config.clip_percentile,
        clipped_points = report.clipped_points;
        "Fitted map to canvas"
    );

    let planar: HashMap<OsmId, PlanarPoint> = planar.into_iter().collect();
    let resolver = config.resolver();
    let styled: Vec<StyledRoad> = roads
        .into_iter()
        .map(|road| StyledRoad {
            style: resolver.resolve(road.tier),
            points: road
                .node_ids
                .iter()
                .filter_map(|id| planar.get(id))
                .map(|p| transform.to_canvas(*p))
                .collect(),
            way_id: road.way_id,
            name: road.name,
            highway: road.highway,
            tier: road.tier,
        })
        .collect();

    let canvas = Canvas {
        width: transform.canvas_width(),
        height: transform.canvas_height(),
        background: config.background,
    };
    let document = draw_map::emit_svg(&canvas, &styled)?;

    report.degenerate_roads = document.skipped;
    report.paths = document.paths;
    report.width = canvas.width;
    report.height = canvas.height;

    if report.is_empty() {
        warn!(etl_name = draw_map::ETL_NAME, roads = report.roads; "No roads left to draw, document only has the background");
    }
    info!(
        etl_name = draw_map::ETL_NAME,
        paths = report.paths,
        dangling_ways = report.dangling_ways,
        degenerate_roads = report.degenerate_roads;
        "Drew road map"
    );

    Ok(Conversion {
        svg: document.markup,
        report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    #[test]
    fn invalid_config_fails_before_parsing() {
        let config = RenderConfig { clip_percentile: 75.0, ..Default::default() };
        let err = convert_str("not even xml <", &config).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Config);
    }

    #[test]
    fn empty_export_still_renders() {
        let config = RenderConfig { width: 400, ..Default::default() };
        let conversion = convert_str("<osm></osm>", &config).unwrap();
        assert!(conversion.report.is_empty());
        assert_eq!((conversion.report.width, conversion.report.height), (400, 400));
        assert!(conversion.svg.contains("<svg"));
    }

    #[test]
    fn report_counts_every_way() {
        let doc = r#"<osm>
            <node id="1" lat="10" lon="10"/><node id="2" lat="10.01" lon="10.01"/>
            <way id="1"><nd ref="1"/><nd ref="2"/><tag k="highway" v="primary"/></way>
            <way id="2"><nd ref="1"/><nd ref="3"/><tag k="highway" v="primary"/></way>
            <way id="3"><nd ref="1"/><nd ref="2"/><tag k="building" v="yes"/></way>
            <way id="4"><nd ref="2"/><tag k="highway" v="steps"/></way>
        </osm>"#;
        let report = convert_str(doc, &RenderConfig::default()).unwrap().report;
        assert_eq!(report.nodes, 2);
        assert_eq!(report.ways, 4);
        assert_eq!(report.dangling_ways, 1);
        assert_eq!(report.non_road_ways, 1);
        assert_eq!(report.roads, 2);
        assert_eq!(report.degenerate_roads, 1);
        assert_eq!(report.paths, 1);
        assert_eq!(report.clipped_points, 0);
    }
}
