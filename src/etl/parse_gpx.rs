use std::fs;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::{debug, info};
use regex::Regex;
use xz::bufread::XzDecoder;

use crate::data::osm::Location;
use crate::errors::Result;

const POINT_TAGS: [&str; 3] = ["<trkpt", "<wpt", "<rtept"];

/// Line-oriented reader for waypoints, track points and route points.
///
/// Every point has to sit on a single line together with both of its
/// coordinate attributes, which holds for GPX written by common tools.
pub struct TrackPointParser {
    lat_re: Regex,
    lon_re: Regex,
}

impl TrackPointParser {
    pub fn new() -> TrackPointParser {
        TrackPointParser {
            lat_re: Regex::new(r#"\blat="(?<value>-?\d+(?:\.\d+)?)""#).unwrap(),
            lon_re: Regex::new(r#"\blon="(?<value>-?\d+(?:\.\d+)?)""#).unwrap(),
        }
    }

    fn capture(re: &Regex, line: &str) -> Option<f64> {
        re.captures(line)?.name("value")?.as_str().parse().ok()
    }

    /// None for lines that are not points or whose coordinates are missing or malformed.
    pub fn parse_line(&self, line: &str) -> Option<Location> {
        if !POINT_TAGS.iter().any(|tag| line.contains(tag)) {
            return None;
        }
        let lat = Self::capture(&self.lat_re, line)?;
        let lon = Self::capture(&self.lon_re, line)?;
        Some(Location::new(lat, lon))
    }

    pub fn parse_reader(&self, reader: impl BufRead) -> Result<Vec<Location>> {
        let mut locations = Vec::new();
        for line in reader.lines() {
            if let Some(location) = self.parse_line(&line?) {
                locations.push(location);
            }
        }
        Ok(locations)
    }

    /// Reads a track file, decompressing it first if its name ends in `.xz`.
    pub fn parse_file(&self, path: &Path) -> Result<Vec<Location>> {
        info!(file = path.display().to_string(); "Parsing {}", path.display());
        let file_reader = BufReader::new(fs::File::open(path)?);

        let locations = if path.extension().is_some_and(|ext| ext == "xz") {
            self.parse_reader(BufReader::new(XzDecoder::new(file_reader)))?
        } else {
            self.parse_reader(file_reader)?
        };

        debug!(count = locations.len(); "Read {} locations", locations.len());
        Ok(locations)
    }
}

impl Default for TrackPointParser {
    fn default() -> Self {
        TrackPointParser::new()
    }
}

pub fn parse_track_points(path: &Path) -> Result<Vec<Location>> {
    TrackPointParser::new().parse_file(path)
}
