use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

use log::info;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::data::osm::{Node, OsmId, Way};
use crate::errors::Result;

const GPX_NAMESPACE: &str = "http://www.topografix.com/GPX/1/1";
const SCHEMA_LOCATION: &str =
    "http://www.topografix.com/GPX/1/1 http://www.topografix.com/GPX/1/1/gpx.xsd";
const CREATOR: &str = "overpass_along_gpx";

fn write_osm_id<W: Write>(writer: &mut Writer<W>, id: OsmId) -> quick_xml::Result<()> {
    writer.create_element("extensions").write_inner_content(|w| {
        w.create_element("osmid").write_text_content(BytesText::new(&id.to_string()))?;
        Ok::<(), quick_xml::Error>(())
    })?;
    Ok(())
}

fn write_node<W: Write>(writer: &mut Writer<W>, node: &Node) -> quick_xml::Result<()> {
    writer.create_element("wpt")
        .with_attribute(("lat", node.loc.lat.to_string().as_str()))
        .with_attribute(("lon", node.loc.lon.to_string().as_str()))
        .write_inner_content(|w| write_osm_id(w, node.id))?;
    Ok(())
}

fn write_way<W: Write>(writer: &mut Writer<W>, way: &Way) -> quick_xml::Result<()> {
    writer.create_element("trk").write_inner_content(|w| {
        w.create_element("trkseg").write_inner_content(|w| {
            for point in &way.points {
                w.create_element("trkpt")
                    .with_attribute(("lat", point.lat.to_string().as_str()))
                    .with_attribute(("lon", point.lon.to_string().as_str()))
                    .write_empty()?;
            }
            Ok::<(), quick_xml::Error>(())
        })?;
        write_osm_id(w, way.id)
    })?;
    Ok(())
}

/// Writes nodes as waypoints followed by ways as single-segment tracks.
pub fn write_gpx<W: Write>(out: W, title: Option<&str>, nodes: &[Node], ways: &[Way]) -> Result<()> {
    let mut writer = Writer::new_with_indent(out, b' ', 1);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer.write_event(Event::Start(BytesStart::new("gpx").with_attributes([
        ("xmlns", GPX_NAMESPACE),
        ("xmlns:xsi", "http://www.w3.org/2001/XMLSchema-instance"),
        ("xsi:schemaLocation", SCHEMA_LOCATION),
        ("version", "1.1"),
        ("creator", CREATOR),
    ])))?;

    if let Some(title) = title {
        writer.create_element("metadata").write_inner_content(|w| {
            w.create_element("name").write_text_content(BytesText::new(title))?;
            Ok::<(), quick_xml::Error>(())
        })?;
    }
    for node in nodes {
        write_node(&mut writer, node)?;
    }
    for way in ways {
        write_way(&mut writer, way)?;
    }

    writer.write_event(Event::End(BytesEnd::new("gpx")))?;
    writer.get_mut().write_all(b"\n")?;
    writer.into_inner().flush()?;
    Ok(())
}

pub fn write_track_result(path: &Path, title: Option<&str>, nodes: &[Node], ways: &[Way]) -> Result<()> {
    info!(file = path.display().to_string(); "Writing result to {}", path.display());
    let file = fs::File::create(path)?;
    write_gpx(BufWriter::new(file), title, nodes, ways)?;
    info!(nodes = nodes.len(), ways = ways.len(); "Wrote result");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::osm::Location;

    fn render(title: Option<&str>, nodes: &[Node], ways: &[Way]) -> String {
        let mut buf = Vec::new();
        write_gpx(&mut buf, title, nodes, ways).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn nodes_precede_ways_and_keep_their_ids() {
        let nodes = vec![Node { id: 42, loc: Location::new(51.0, 13.5) }];
        let ways = vec![Way {
            id: 7,
            points: vec![Location::new(51.2, 13.2), Location::new(51.1, 13.1)],
        }];

        let gpx = render(None, &nodes, &ways);

        let wpt = gpx.find(r#"<wpt lat="51" lon="13.5">"#).unwrap();
        let trk = gpx.find("<trk>").unwrap();
        assert!(wpt < trk);
        assert!(gpx.contains("<osmid>42</osmid>"));
        assert!(gpx.contains("<osmid>7</osmid>"));

        let first = gpx.find(r#"<trkpt lat="51.2" lon="13.2"/>"#).unwrap();
        let second = gpx.find(r#"<trkpt lat="51.1" lon="13.1"/>"#).unwrap();
        assert!(first < second);
        assert!(!gpx.contains("<metadata>"));
        assert!(gpx.trim_end().ends_with("</gpx>"));
    }

    #[test]
    fn title_is_escaped() {
        let gpx = render(Some("Benches & bins <Dresden>"), &[], &[]);
        assert!(gpx.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(gpx.contains("<name>Benches &amp; bins &lt;Dresden&gt;</name>"));
    }

    #[test]
    fn written_file_can_be_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.gpx");
        let nodes = vec![Node { id: 1, loc: Location::new(-33.45, -70.66) }];
        let ways = vec![Way { id: 2, points: vec![Location::new(1.5, 2.5), Location::new(3.5, 4.5)] }];

        write_track_result(&path, Some("t"), &nodes, &ways).unwrap();

        let parsed = crate::etl::parse_gpx::parse_track_points(&path).unwrap();
        assert_eq!(parsed, vec![
            Location::new(-33.45, -70.66),
            Location::new(1.5, 2.5),
            Location::new(3.5, 4.5),
        ]);
    }
}
