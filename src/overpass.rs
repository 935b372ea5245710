//! Chunked querying of the Overpass API around a list of locations.

pub mod chunks;
pub mod executor;
pub mod query;
pub mod response;

pub use chunks::{run_chunks, QueryPlan, RunResult};
pub use executor::{Backoff, QueryExecutor, Transport, UreqTransport};
