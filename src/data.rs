use std::collections::HashSet;

use self::osm::{Feature, Node, OsmId, Way};

pub mod osm;
pub mod overpass;

/// Deduplicated features collected over all chunked queries of one run.
/// Nodes and ways are kept in first-seen order.
#[derive(Debug, Default, Clone)]
pub struct FeatureStore {
    nodes: Vec<Node>,
    ways: Vec<Way>,
    seen_node_ids: HashSet<OsmId>,
    seen_way_ids: HashSet<OsmId>,
}

impl FeatureStore {
    pub fn new() -> Self {
        FeatureStore::default()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn ways(&self) -> &[Way] {
        &self.ways
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.ways.is_empty()
    }

    /// Returns false, leaving the store untouched, if a feature with the same
    /// kind and id was inserted before.
    pub fn insert(&mut self, feature: Feature) -> bool {
        match feature {
            Feature::Node(node) => {
                if !self.seen_node_ids.insert(node.id) {
                    return false;
                }
                self.nodes.push(node);
            },
            Feature::Way(way) => {
                if !self.seen_way_ids.insert(way.id) {
                    return false;
                }
                self.ways.push(way);
            },
        }
        true
    }
}
