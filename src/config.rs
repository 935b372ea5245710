use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{ArgAction, Parser};
use serde::Deserialize;

use crate::errors::Result;
use crate::overpass::{Backoff, QueryPlan};

/// Query Overpass API along GPX files and write the result to a GPX file
#[derive(Parser, Debug)]
#[command(
    name = "overpass_along_gpx",
    version,
    after_help = "example: overpass_along_gpx -o out.gpx -q 'way[\"highway\"][!\"surface\"]' in.gpx",
)]
pub struct Cli {
    /// GPX files to read, optionally xz compressed
    pub files: Vec<PathBuf>,

    /// Output file
    #[arg(short, long, value_name = "FILE")]
    pub outfile: PathBuf,

    /// Overpass API tag query, e.g. 'node["amenity"~"bench|waste_basket"]'
    #[arg(short, long)]
    pub query: Option<String>,

    /// File that contains Overpass API tag queries, one query per line
    #[arg(short = 'f', long, value_name = "FILE")]
    pub queryfile: Option<PathBuf>,

    /// Title of the resulting GPX file
    #[arg(short, long)]
    pub name: Option<String>,

    /// Timeout of the Overpass API query in seconds [default: 120]
    #[arg(short, long)]
    pub timeout: Option<u32>,

    /// Maximum distance around track in meters to query Overpass API for [default: 20]
    #[arg(short, long)]
    pub distance: Option<u32>,

    /// Limit number of locations per Overpass API query, 0 for unlimited (try 500 if requests fail) [default: 0]
    #[arg(short, long, allow_negative_numbers = true)]
    pub limit: Option<i64>,

    /// Number of retries if a call to Overpass API fails [default: 3]
    #[arg(short, long)]
    pub retries: Option<u32>,

    /// Overpass API instance [default: https://overpass-api.de/api/]
    #[arg(short, long)]
    pub url: Option<String>,

    /// Don't execute the Overpass API query, only print it
    #[arg(long)]
    pub dry_run: bool,

    /// Print debugging information (use twice to be more verbose)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// JSON file with default settings, overridden by the flags above
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

pub enum QuerySource {
    Inline(String),
    File(PathBuf),
}

impl Cli {
    /// Exactly one of `--query` and `--queryfile` must be given; None otherwise.
    pub fn query_source(&self) -> Option<QuerySource> {
        match (&self.query, &self.queryfile) {
            (Some(query), None) => Some(QuerySource::Inline(query.clone())),
            (None, Some(path)) => Some(QuerySource::File(path.clone())),
            _ => None,
        }
    }

    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub endpoint: String,
    pub timeout: u32,
    pub distance: u32,
    pub limit: i64,
    pub retries: u32,
    pub backoff_ms: u64,
    pub rate_limit_backoff_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        let backoff = Backoff::default();
        Settings {
            endpoint: "https://overpass-api.de/api/".to_string(),
            timeout: 120,
            distance: 20,
            limit: 0,
            retries: 3,
            backoff_ms: backoff.short.as_millis() as u64,
            rate_limit_backoff_ms: backoff.rate_limited.as_millis() as u64,
        }
    }
}

pub fn load_settings(path: &Path) -> Result<Settings> {
    let file = File::open(path)?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

/// One fragment per line. Blank lines and `#` comments are ignored.
pub fn read_query_file(path: &Path) -> Result<Vec<String>> {
    let reader = BufReader::new(File::open(path)?);
    let mut fragments = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let fragment = line.trim();
        if fragment.is_empty() || fragment.starts_with('#') {
            continue;
        }
        fragments.push(fragment.to_string());
    }
    Ok(fragments)
}

/// Fully resolved parameters of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub input_files: Vec<PathBuf>,
    pub output_file: PathBuf,
    pub title: Option<String>,
    pub plan: QueryPlan,
    pub endpoint: String,
    pub max_retries: u32,
    pub backoff: Backoff,
}

impl Job {
    pub fn new(cli: &Cli, settings: Settings, source: QuerySource) -> Result<Job> {
        let fragments = match source {
            QuerySource::Inline(query) => vec![query],
            QuerySource::File(path) => read_query_file(&path)?,
        };

        Ok(Job {
            input_files: cli.files.clone(),
            output_file: cli.outfile.clone(),
            title: cli.name.clone(),
            plan: QueryPlan {
                fragments,
                timeout_seconds: cli.timeout.unwrap_or(settings.timeout),
                radius_meters: cli.distance.unwrap_or(settings.distance),
                chunk_limit: cli.limit.unwrap_or(settings.limit),
                dry_run: cli.dry_run,
            },
            endpoint: cli.url.clone().unwrap_or(settings.endpoint),
            max_retries: cli.retries.unwrap_or(settings.retries),
            backoff: Backoff {
                short: Duration::from_millis(settings.backoff_ms),
                rate_limited: Duration::from_millis(settings.rate_limit_backoff_ms),
            },
        })
    }
}
