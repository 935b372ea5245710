use log::{debug, info};

use crate::data::osm::Feature;
use crate::data::overpass::OverpassResponse;
use crate::data::FeatureStore;

/// Features newly added to the store by one response. Diagnostic only.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ProcessCounts {
    pub nodes_added: usize,
    pub ways_added: usize,
}

/// Merges the nodes and ways of `response` into `store`, skipping ids already present.
///
/// Overlapping chunk queries routinely return the same feature twice, so
/// duplicates are expected and not an error.
pub fn process_response(response: OverpassResponse, store: &mut FeatureStore) -> ProcessCounts {
    let mut counts = ProcessCounts::default();

    for feature in response.elements.into_iter().filter_map(|element| element.into_feature()) {
        let (is_node, id) = match &feature {
            Feature::Node(node) => (true, node.id),
            Feature::Way(way) => (false, way.id),
        };
        let kind = if is_node { "node" } else { "way" };

        if !store.insert(feature) {
            debug!(kind = kind, id = id; "Skipping previously obtained {} {}", kind, id);
            continue;
        }

        debug!(kind = kind, id = id; "Adding new {} {}", kind, id);
        if is_node {
            counts.nodes_added += 1;
        } else {
            counts.ways_added += 1;
        }
    }

    info!(ways = counts.ways_added, nodes = counts.nodes_added;
        "Obtained {} ways and {} nodes from Overpass API", counts.ways_added, counts.nodes_added);
    counts
}
