use crate::data::osm::Location;

#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    pub query_text: String,
    pub timeout_seconds: u32,
}

/// Builds an Overpass QL query selecting every fragment within `radius_meters`
/// of any of `locations`. Fragments are inserted verbatim, in order.
pub fn build_query(
    locations: &[Location],
    fragments: &[String],
    timeout_seconds: u32,
    radius_meters: u32,
) -> String {
    let latlon = locations.iter()
        .map(|loc| loc.to_string())
        .collect::<Vec<_>>()
        .join(",");

    let mut query = format!("[out:json][timeout:{}];\n(\n", timeout_seconds);
    for fragment in fragments {
        query.push_str(&format!("    {}(around:{},{});\n", fragment, radius_meters, latlon));
    }
    query.push_str(");\nout geom;");
    query
}

impl QueryRequest {
    pub fn new(
        locations: &[Location],
        fragments: &[String],
        timeout_seconds: u32,
        radius_meters: u32,
    ) -> Self {
        QueryRequest {
            query_text: build_query(locations, fragments, timeout_seconds, radius_meters),
            timeout_seconds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_clause_per_fragment_sharing_coordinates() {
        let locations = vec![Location::new(51.0, 13.5), Location::new(51.1, 13.6)];
        let fragments = vec![
            r#"way["highway"][!"surface"]"#.to_string(),
            r#"node["amenity"="bench"]"#.to_string(),
        ];

        let query = build_query(&locations, &fragments, 120, 20);

        assert_eq!(query, concat!(
            "[out:json][timeout:120];\n",
            "(\n",
            "    way[\"highway\"][!\"surface\"](around:20,51,13.5,51.1,13.6);\n",
            "    node[\"amenity\"=\"bench\"](around:20,51,13.5,51.1,13.6);\n",
            ");\n",
            "out geom;",
        ));
    }

    #[test]
    fn empty_fragments_yield_empty_union() {
        let query = build_query(&[Location::new(1.0, 2.0)], &[], 30, 5);
        assert_eq!(query, "[out:json][timeout:30];\n(\n);\nout geom;");
    }

    #[test]
    fn request_carries_timeout() {
        let request = QueryRequest::new(&[], &["node".to_string()], 60, 10);
        assert_eq!(request.timeout_seconds, 60);
        assert!(request.query_text.contains("node(around:10,);"));
    }
}
