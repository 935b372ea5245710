use log::{info, warn};

use crate::config::Job;
use crate::data::osm::Location;
use crate::data::FeatureStore;
use crate::errors::Result;
use crate::overpass::{run_chunks, QueryExecutor, RunResult, Transport};

use super::parse_gpx::parse_track_points;
use super::write_gpx::write_track_result;
use super::Etl;

const ETL_NAME: &str = "overpass_along_track";

pub struct Output {
    store: FeatureStore,
    run: RunResult,
}

/// Reads track files, queries the Overpass API around their points and
/// writes the collected features to a single GPX file.
pub struct AlongTrackEtl<'a, T: Transport> {
    job: &'a Job,
    executor: QueryExecutor<T>,
}

impl<'a, T: Transport> AlongTrackEtl<'a, T> {
    pub fn new(job: &'a Job, transport: T) -> AlongTrackEtl<'a, T> {
        AlongTrackEtl {
            job,
            executor: QueryExecutor::new(transport, &job.endpoint, job.max_retries, job.backoff),
        }
    }

    #[cfg(test)]
    fn executor(&self) -> &QueryExecutor<T> {
        &self.executor
    }
}

impl<T: Transport> Etl for AlongTrackEtl<'_, T> {
    type Input = Vec<Location>;
    type Output = Output;

    fn etl_name(&self) -> &str {
        ETL_NAME
    }

    fn extract(&mut self) -> Result<Self::Input> {
        let mut locations = Vec::new();
        for path in &self.job.input_files {
            locations.extend(parse_track_points(path)?);
        }
        info!(count = locations.len(); "Read {} locations", locations.len());
        Ok(locations)
    }

    fn transform(&mut self, input: Self::Input) -> Result<Self::Output> {
        let mut store = FeatureStore::new();
        if input.is_empty() {
            info!("No locations found");
            return Ok(Output {
                store,
                run: RunResult::default(),
            });
        }

        let run = run_chunks(&mut self.executor, &input, &self.job.plan, &mut store);
        Ok(Output {
            store,
            run,
        })
    }

    fn load(&mut self, output: Self::Output) -> Result<()> {
        if let Some(query) = output.run.dry_run_query {
            println!("{}", query);
            return Ok(());
        }

        if output.store.is_empty() {
            info!("No features obtained, not writing {}", self.job.output_file.display());
        } else {
            write_track_result(
                &self.job.output_file,
                self.job.title.as_deref(),
                output.store.nodes(),
                output.store.ways(),
            )?;
        }

        if output.run.any_chunk_failed {
            warn!(chunks_failed = output.run.chunks_failed, chunks = output.run.chunks_attempted;
                "Result may be incomplete due to failed Overpass API calls");
        }
        Ok(())
    }
}
