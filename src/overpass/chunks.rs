use log::{debug, info, trace, warn};

use crate::data::osm::Location;
use crate::data::FeatureStore;

use super::executor::{QueryExecutor, Transport};
use super::query::QueryRequest;
use super::response::process_response;

/// Everything needed to turn a location list into chunked queries.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    pub fragments: Vec<String>,
    pub timeout_seconds: u32,
    pub radius_meters: u32,
    /// Maximum locations per query; zero or negative means a single query.
    pub chunk_limit: i64,
    pub dry_run: bool,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct RunResult {
    pub any_chunk_failed: bool,
    pub chunks_attempted: usize,
    pub chunks_failed: usize,
    pub nodes_added: usize,
    pub ways_added: usize,
    /// Query text of the first chunk, set only for dry runs.
    pub dry_run_query: Option<String>,
}

/// Contiguous, non-overlapping slices of `locations` in their original order.
pub fn split_chunks(locations: &[Location], chunk_limit: i64) -> Vec<&[Location]> {
    match usize::try_from(chunk_limit) {
        Ok(size) if size > 0 => locations.chunks(size).collect(),
        _ => vec![locations],
    }
}

/// Queries every chunk in turn, merging results into `store`.
///
/// A failed chunk marks the result as incomplete but does not stop the run.
pub fn run_chunks<T: Transport>(
    executor: &mut QueryExecutor<T>,
    locations: &[Location],
    plan: &QueryPlan,
    store: &mut FeatureStore,
) -> RunResult {
    let chunks = split_chunks(locations, plan.chunk_limit);
    let mut result = RunResult::default();

    info!(fragments = plan.fragments.len(); "Queries: {:?}", plan.fragments);
    debug!(chunks = chunks.len(), locations = locations.len();
        "Performing {} queries with at most {} locations each for {} locations in total",
        chunks.len(), chunks.first().map_or(0, |chunk| chunk.len()), locations.len());

    let mut start = 0;
    for (index, chunk) in tqdm::tqdm(chunks.iter().enumerate()) {
        let end = start + chunk.len();
        if chunks.len() > 1 {
            debug!(chunk = index, from = start + 1, to = end;
                "Chunk {} of {} for {} locations from {} to {}", index, chunks.len(), chunk.len(), start + 1, end);
        }
        start = end;

        let request = QueryRequest::new(chunk, &plan.fragments, plan.timeout_seconds, plan.radius_meters);
        info!(locations = chunk.len(), timeout = request.timeout_seconds;
            "Performing Overpass API query for {} locations", chunk.len());
        trace!("Query:\n{}", request.query_text);

        if plan.dry_run {
            result.dry_run_query = Some(request.query_text);
            return result;
        }

        result.chunks_attempted += 1;
        match executor.execute(&request) {
            Ok(response) => {
                let counts = process_response(response, store);
                result.nodes_added += counts.nodes_added;
                result.ways_added += counts.ways_added;
            },
            Err(err) => {
                warn!(chunk = index, err = err.to_string(); "Giving up on chunk");
                result.any_chunk_failed = true;
                result.chunks_failed += 1;
            },
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::QueryError;
    use crate::overpass::executor::testing::*;

    fn locations(count: usize) -> Vec<Location> {
        (0..count).map(|i| Location::new(50.0 + i as f64 / 10.0, 13.0)).collect()
    }

    fn plan(chunk_limit: i64, dry_run: bool) -> QueryPlan {
        QueryPlan {
            fragments: vec![r#"node["amenity"="bench"]"#.to_string()],
            timeout_seconds: 60,
            radius_meters: 20,
            chunk_limit,
            dry_run,
        }
    }

    fn node_reply(id: i64) -> Result<String, QueryError> {
        Ok(format!(r#"{{"elements": [{{"type": "node", "id": {}, "lat": 51.0, "lon": 13.0}}]}}"#, id))
    }

    #[test]
    fn chunks_partition_locations_in_order() {
        for count in 0..12 {
            let input = locations(count);
            for limit in 1..6 {
                let chunks = split_chunks(&input, limit);
                let limit = limit as usize;

                assert_eq!(chunks.len(), count.div_ceil(limit));
                for (i, chunk) in chunks.iter().enumerate() {
                    if i + 1 < chunks.len() {
                        assert_eq!(chunk.len(), limit);
                    } else {
                        assert!(!chunk.is_empty() && chunk.len() <= limit);
                    }
                }
                assert_eq!(chunks.concat(), input);
            }
        }
    }

    #[test]
    fn three_points_limit_two() {
        let input = vec![
            Location::new(51.0, 13.0),
            Location::new(51.1, 13.1),
            Location::new(51.2, 13.2),
        ];
        let chunks = split_chunks(&input, 2);
        assert_eq!(chunks, vec![&input[0..2], &input[2..3]]);
    }

    #[test]
    fn non_positive_limit_means_one_chunk() {
        let input = locations(7);
        assert_eq!(split_chunks(&input, 0), vec![&input[..]]);
        assert_eq!(split_chunks(&input, -3), vec![&input[..]]);
    }

    #[test]
    fn same_node_from_two_chunks_is_kept_once() {
        let transport = ScriptedTransport::new(vec![node_reply(42), node_reply(42)]);
        let mut executor = QueryExecutor::new(transport, "http://x", 0, no_backoff());
        let mut store = FeatureStore::new();

        let result = run_chunks(&mut executor, &locations(4), &plan(2, false), &mut store);

        assert!(!result.any_chunk_failed);
        assert_eq!(result.chunks_attempted, 2);
        assert_eq!(result.nodes_added, 1);
        assert_eq!(store.nodes().len(), 1);
        assert_eq!(store.nodes()[0].id, 42);
    }

    #[test]
    fn failed_chunk_does_not_stop_the_run() {
        let transport = ScriptedTransport::new(vec![
            refused(),
            refused(),
            node_reply(1),
            node_reply(2),
        ]);
        let mut executor = QueryExecutor::new(transport, "http://x", 1, no_backoff());
        let mut store = FeatureStore::new();

        let result = run_chunks(&mut executor, &locations(5), &plan(2, false), &mut store);

        assert!(result.any_chunk_failed);
        assert_eq!(result.chunks_attempted, 3);
        assert_eq!(result.chunks_failed, 1);
        let ids: Vec<i64> = store.nodes().iter().map(|node| node.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(executor.transport().requests.len(), 4);
    }

    #[test]
    fn each_chunk_queries_only_its_own_locations() {
        let transport = ScriptedTransport::new(vec![node_reply(1), node_reply(2)]);
        let mut executor = QueryExecutor::new(transport, "http://x", 0, no_backoff());
        let input = vec![
            Location::new(51.0, 13.0),
            Location::new(51.1, 13.1),
            Location::new(51.2, 13.2),
        ];

        run_chunks(&mut executor, &input, &plan(2, false), &mut FeatureStore::new());

        let queries: Vec<&str> = executor.transport().requests.iter()
            .map(|(_, query)| query.as_str())
            .collect();
        assert!(queries[0].contains("(around:20,51,13,51.1,13.1);"));
        assert!(queries[1].contains("(around:20,51.2,13.2);"));
    }

    #[test]
    fn dry_run_touches_neither_network_nor_store() {
        let transport = ScriptedTransport::new(vec![node_reply(1)]);
        let mut executor = QueryExecutor::new(transport, "http://x", 3, no_backoff());
        let mut store = FeatureStore::new();

        let result = run_chunks(&mut executor, &locations(50), &plan(10, true), &mut store);

        assert!(store.is_empty());
        assert!(executor.transport().requests.is_empty());
        assert_eq!(result.chunks_attempted, 0);
        assert!(!result.any_chunk_failed);
        let query = result.dry_run_query.unwrap();
        assert!(query.starts_with("[out:json][timeout:60];"));
        assert!(query.contains("50,13,50.1,13"));
        assert!(!query.contains("51,13"));
    }
}
