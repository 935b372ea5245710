use std::fmt;

pub type OsmId = i64;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    pub lat: f64,
    pub lon: f64,
}

impl Location {
    pub fn new(lat: f64, lon: f64) -> Self {
        Location { lat, lon }
    }
}

/// Renders as `lat,lon`, the coordinate pair syntax of Overpass QL.
impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat, self.lon)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: OsmId,
    pub loc: Location,
}

/// A way with its full geometry, in the order the service returned it.
#[derive(Debug, Clone, PartialEq)]
pub struct Way {
    pub id: OsmId,
    pub points: Vec<Location>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Feature {
    Node(Node),
    Way(Way),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_renders_as_coordinate_pair() {
        assert_eq!(Location::new(51.1, 13.25).to_string(), "51.1,13.25");
        assert_eq!(Location::new(-33.5, -70.125).to_string(), "-33.5,-70.125");
    }
}
