use log::debug;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::{
    data::{osm::OsmId, semantic::PriorityTier},
    errors::Result,
    gradient::{Rgb, RoadStyle},
    projection::CanvasPoint,
};

pub const ETL_NAME: &str = "draw_map";

const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";
const TITLE: &str = "Road Network Map";
const DESCRIPTION: &str = "Generated from OpenStreetMap data";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
    /// `None` leaves the background transparent.
    pub background: Option<Rgb>,
}

/// A road ready to draw: style resolved, coordinates on the canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct StyledRoad {
    pub way_id: OsmId,
    pub name: Option<String>,
    pub highway: String,
    pub tier: PriorityTier,
    pub style: RoadStyle,
    pub points: Vec<CanvasPoint>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SvgDocument {
    pub markup: String,
    pub paths: usize,
    /// Roads left out for having fewer than two points.
    pub skipped: usize,
}

/// `M x y L x y ...` with two decimals per coordinate.
fn path_data(points: &[CanvasPoint]) -> String {
    let mut d = String::with_capacity(points.len() * 16);
    for (idx, point) in points.iter().enumerate() {
        let command = if idx == 0 { "M" } else { " L" };
        d.push_str(&format!("{} {:.2} {:.2}", command, point.x, point.y));
    }
    d
}

fn road_path(road: &StyledRoad) -> BytesStart<'static> {
    let d = path_data(&road.points);
    let stroke = road.style.color.to_string();
    let stroke_width = format!("{:.2}", road.style.stroke_width);
    let way_id = road.way_id.to_string();

    let mut path = BytesStart::new("path").with_attributes([
        ("d", d.as_str()),
        ("stroke", stroke.as_str()),
        ("stroke-width", stroke_width.as_str()),
        ("data-id", way_id.as_str()),
        ("data-highway", road.highway.as_str()),
    ]);
    if let Some(name) = &road.name {
        path.push_attribute(("data-name", name.as_str()));
    }
    path
}

/// Writes the whole document. Roads are drawn from the least to the most important tier,
/// keeping input order inside a tier, so major roads end up on top.
pub fn emit_svg(canvas: &Canvas, roads: &[StyledRoad]) -> Result<SvgDocument> {
    let (drawable, short): (Vec<&StyledRoad>, Vec<&StyledRoad>) =
        roads.iter().partition(|road| road.points.len() >= 2);
    for road in &short {
        debug!(etl_name = ETL_NAME, way_id = road.way_id, points = road.points.len(); "Skipping road with fewer than two points");
    }

    let width = canvas.width.to_string();
    let height = canvas.height.to_string();
    let view_box = format!("0 0 {} {}", canvas.width, canvas.height);

    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer.write_event(Event::Start(BytesStart::new("svg").with_attributes([
        ("xmlns", SVG_NAMESPACE),
        ("width", width.as_str()),
        ("height", height.as_str()),
        ("viewBox", view_box.as_str()),
    ])))?;
    for (tag, text) in [("title", TITLE), ("desc", DESCRIPTION)] {
        writer.write_event(Event::Start(BytesStart::new(tag)))?;
        writer.write_event(Event::Text(BytesText::new(text)))?;
        writer.write_event(Event::End(BytesEnd::new(tag)))?;
    }

    if let Some(background) = canvas.background {
        let fill = background.to_string();
        writer.write_event(Event::Empty(BytesStart::new("rect").with_attributes([
            ("width", "100%"),
            ("height", "100%"),
            ("fill", fill.as_str()),
        ])))?;
    }

    writer.write_event(Event::Start(BytesStart::new("g").with_attributes([
        ("class", "roads"),
        ("fill", "none"),
        ("stroke-linecap", "round"),
        ("stroke-linejoin", "round"),
    ])))?;
    let mut paths = 0;
    for tier in PriorityTier::ALL {
        let tier_roads: Vec<&&StyledRoad> = drawable.iter().filter(|road| road.tier == tier).collect();
        if tier_roads.is_empty() {
            continue;
        }
        let class = format!("tier-{}", tier.name());
        writer.write_event(Event::Start(BytesStart::new("g").with_attributes([("class", class.as_str())])))?;
        for road in tier_roads {
            writer.write_event(Event::Empty(road_path(road)))?;
            paths += 1;
        }
        writer.write_event(Event::End(BytesEnd::new("g")))?;
    }
    writer.write_event(Event::End(BytesEnd::new("g")))?;
    writer.write_event(Event::End(BytesEnd::new("svg")))?;

    let mut markup = String::from_utf8(writer.into_inner())?;
    markup.push('\n');

    Ok(SvgDocument {
        markup,
        paths,
        skipped: short.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use quick_xml::reader::Reader;

    fn road(way_id: OsmId, tier: PriorityTier, points: &[(f64, f64)]) -> StyledRoad {
        StyledRoad {
            way_id,
            name: None,
            highway: "residential".into(),
            tier,
            style: RoadStyle { color: Rgb::gray(0x80), stroke_width: 1.5 },
            points: points.iter().map(|&(x, y)| CanvasPoint { x, y }).collect(),
        }
    }

    fn canvas() -> Canvas {
        Canvas { width: 100, height: 50, background: None }
    }

    fn path_ids(markup: &str) -> Vec<String> {
        let mut reader = Reader::from_str(markup);
        let mut ids = Vec::new();
        loop {
            match reader.read_event().unwrap() {
                Event::Eof => break,
                Event::Empty(e) if e.name().as_ref() == b"path" => {
                    let id = e.try_get_attribute("data-id").unwrap().unwrap();
                    ids.push(id.unescape_value().unwrap().into_owned());
                },
                _ => (),
            }
        }
        ids
    }

    #[test]
    fn formats_path_data_with_fixed_precision() {
        let points = [CanvasPoint { x: 1.0, y: 2.5 }, CanvasPoint { x: 3.14159, y: 0.006 }];
        assert_eq!(path_data(&points), "M 1.00 2.50 L 3.14 0.01");
    }

    #[test]
    fn draws_minor_roads_first() {
        let roads = vec![
            road(1, PriorityTier::Highest, &[(0.0, 0.0), (1.0, 1.0)]),
            road(2, PriorityTier::Lowest, &[(0.0, 0.0), (1.0, 1.0)]),
            road(3, PriorityTier::Medium, &[(0.0, 0.0), (1.0, 1.0)]),
            road(4, PriorityTier::Lowest, &[(2.0, 0.0), (1.0, 1.0)]),
        ];
        let doc = emit_svg(&canvas(), &roads).unwrap();
        assert_eq!(doc.paths, 4);
        assert_eq!(path_ids(&doc.markup), vec!["2", "4", "3", "1"]);
    }

    #[test]
    fn skips_roads_without_two_points() {
        let roads = vec![
            road(1, PriorityTier::High, &[(5.0, 5.0)]),
            road(2, PriorityTier::High, &[]),
            road(3, PriorityTier::High, &[(0.0, 0.0), (1.0, 1.0)]),
        ];
        let doc = emit_svg(&canvas(), &roads).unwrap();
        assert_eq!(doc.paths, 1);
        assert_eq!(doc.skipped, 2);
        assert_eq!(path_ids(&doc.markup), vec!["3"]);
    }

    #[test]
    fn root_and_background() {
        let doc = emit_svg(&Canvas { background: Some(Rgb::new(1, 2, 3)), ..canvas() }, &[]).unwrap();
        assert!(doc.markup.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(doc.markup.contains(r#"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="50" viewBox="0 0 100 50">"#));
        assert!(doc.markup.contains(r##"<rect width="100%" height="100%" fill="#010203"/>"##));
        assert_eq!(doc.paths, 0);

        let transparent = emit_svg(&canvas(), &[]).unwrap();
        assert!(!transparent.markup.contains("<rect"));
    }

    #[test]
    fn path_carries_style_and_escaped_name() {
        let mut styled = road(7, PriorityTier::Low, &[(0.0, 0.0), (10.0, 20.0)]);
        styled.name = Some("Rue \"Haute\" & <Basse>".into());
        styled.style = RoadStyle { color: Rgb::new(0xab, 0xcd, 0xef), stroke_width: 2.0 };
        let doc = emit_svg(&canvas(), &[styled]).unwrap();
        assert!(doc.markup.contains(r##"stroke="#abcdef""##));
        assert!(doc.markup.contains(r#"stroke-width="2.00""#));
        assert!(doc.markup.contains(r#"d="M 0.00 0.00 L 10.00 20.00""#));
        assert!(doc.markup.contains("Rue &quot;Haute&quot; &amp; &lt;Basse&gt;"));
        assert_eq!(path_ids(&doc.markup), vec!["7"]);
    }

    #[test]
    fn output_is_deterministic() {
        let roads = vec![
            road(1, PriorityTier::High, &[(0.123, 4.5), (6.0, 7.891)]),
            road(2, PriorityTier::Low, &[(1.0, 1.0), (2.0, 2.0), (3.0, 1.0)]),
        ];
        let first = emit_svg(&canvas(), &roads).unwrap();
        let second = emit_svg(&canvas(), &roads).unwrap();
        assert_eq!(first, second);
    }
}
