mod config;
mod data;
mod errors;
mod etl;
mod overpass;

use std::io;
use std::process;

use clap::{CommandFactory, Parser};
use structured_logger::json::new_writer;
use structured_logger::Builder;

use crate::config::{load_settings, Cli, Job, Settings};
use crate::errors::Result;
use crate::etl::along_track::AlongTrackEtl;
use crate::etl::Etl;
use crate::overpass::UreqTransport;

fn setup_logging(level: &str) {
    Builder::with_level(level)
        .with_target_writer("*", new_writer(io::stderr()))
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let Some(source) = cli.query_source() else {
        eprintln!("error: need either query or queryfile as argument");
        Cli::command().print_help().ok();
        process::exit(1);
    };

    setup_logging(cli.log_level());

    let settings = match &cli.config {
        Some(path) => load_settings(path)?,
        None => Settings::default(),
    };
    let job = Job::new(&cli, settings, source)?;

    let mut etl = AlongTrackEtl::new(&job, UreqTransport::new());
    etl.process()
}
