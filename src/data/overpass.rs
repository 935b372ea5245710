use serde::Deserialize;

use super::osm::{Feature, Location, Node, OsmId, Way};

/// JSON document returned by the Overpass API interpreter for `[out:json]` queries.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct OverpassResponse {
    pub elements: Vec<Element>,

    /// Set when the service accepted the query but could not complete it,
    /// e.g. on a runtime timeout or memory exhaustion.
    #[serde(default)]
    pub remark: Option<String>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Element {
    Node {
        id: OsmId,
        lat: f64,
        lon: f64,
    },
    Way {
        id: OsmId,
        #[serde(default)]
        geometry: Vec<GeometryPoint>,
    },
    #[serde(other)]
    Other,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct GeometryPoint {
    pub lat: f64,
    pub lon: f64,
}

impl From<&GeometryPoint> for Location {
    fn from(value: &GeometryPoint) -> Self {
        Location {
            lat: value.lat,
            lon: value.lon,
        }
    }
}

impl Element {
    pub fn into_feature(self) -> Option<Feature> {
        match self {
            Element::Node { id, lat, lon } => Some(Feature::Node(Node {
                id,
                loc: Location::new(lat, lon),
            })),
            Element::Way { id, geometry } => Some(Feature::Way(Way {
                id,
                points: geometry.iter().map(|point| point.into()).collect(),
            })),
            Element::Other => None,
        }
    }
}
