pub mod bootstrap_config;
mod config;
mod pipeline;

use crate::config::{load_config, ConfigError};
use crate::pipeline::{Jobs, OutputError};
use bootstrap_config::BootstrapConfig;
use common::types::config::Config;
use common::util::logging;
use data_harvester::step1_fetch::FetchError;
use data_harvester::step2_import::ImportError;
use data_harvester::step3_prepare::PrepareError;
use dispatch::batcher::InputMismatch;
use dispatch::errors::DispatchError;
use dispatch::geometry::GeometryError;
use dispatch::locator::LocatorError;
use log::{debug, error};
use polars::error::PolarsError;
use rayon::ThreadPoolBuildError;
use std::fmt::{Display, Formatter};
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(target: "main", "{}", err);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), RouteshardError> {
    let bootstrap_config = BootstrapConfig::read();

    logging::init(bootstrap_config.clone().log_level.into());
    print_startup_message();

    debug!(target: "main", "Using temporary folder at {}", std::env::temp_dir().display());

    let config = load_config(&bootstrap_config)?;

    match config {
        Config::Version1 { engine, dataset, routes, tables, output } => {
            pipeline::run(Jobs { engine, dataset, routes, tables, output })
        }
    }
}

fn print_startup_message() {
    log::info!("\n                 _           _                   _ \n  _ __ ___  _   _| |_ ___  ___| |__   __ _ _ __ __| |\n | '__/ _ \\| | | | __/ _ \\/ __| '_ \\ / _` | '__/ _` |\n | | | (_) | |_| | ||  __/\\__ \\ | | | (_| | | | (_| |\n |_|  \\___/ \\__,_|\\__\\___||___/_| |_|\\__,_|_|  \\__,_|\n\n O S R M   B A T C H   D I S P A T C H\n");
}

#[derive(thiserror::Error, Debug)]
pub enum RouteshardError {
    Config(#[from] ConfigError),
    Pool(#[from] ThreadPoolBuildError),
    Client(#[from] reqwest::Error),
    Locator(#[from] LocatorError),
    Unhealthy { unreachable: usize, total: usize },
    Fetch(#[from] FetchError),
    Import(#[from] ImportError),
    Prepare(#[from] PrepareError),
    Input(#[from] InputMismatch),
    Dispatch(#[from] DispatchError),
    Geometry(#[from] GeometryError),
    Polars(#[from] PolarsError),
    Output(#[from] OutputError),
    IO(#[from] std::io::Error),
}

impl Display for RouteshardError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let unhealthy;
        let err: &dyn Display = match self {
            RouteshardError::Config(err) => err,
            RouteshardError::Pool(err) => err,
            RouteshardError::Client(err) => err,
            RouteshardError::Locator(err) => err,
            RouteshardError::Unhealthy { unreachable, total } => {
                unhealthy = format!("{} of {} engine(s) did not answer the probe", unreachable, total);
                &unhealthy
            }
            RouteshardError::Fetch(err) => err,
            RouteshardError::Import(err) => err,
            RouteshardError::Prepare(err) => err,
            RouteshardError::Input(err) => err,
            RouteshardError::Dispatch(err) => err,
            RouteshardError::Geometry(err) => err,
            RouteshardError::Polars(err) => err,
            RouteshardError::Output(err) => err,
            RouteshardError::IO(err) => err,
        };
        let prefix = match self {
            RouteshardError::Config(_) => "Reading config file",
            RouteshardError::Pool(_) => "Starting execution units",
            RouteshardError::Client(_) => "Building HTTP client",
            RouteshardError::Locator(_) => "Locating engines",
            RouteshardError::Unhealthy { .. } => "Checking engines",
            RouteshardError::Fetch(_) => "Fetching dataset",
            RouteshardError::Import(_) => "Importing dataset",
            RouteshardError::Prepare(_) => "Preparing trips",
            RouteshardError::Input(_) => "Building requests",
            RouteshardError::Dispatch(_) => "Dispatching requests",
            RouteshardError::Geometry(_) => "Building route lines",
            RouteshardError::Polars(_) => "Processing trip data",
            RouteshardError::Output(_) => "Writing output",
            RouteshardError::IO(_) => "Error during IO",
        };
        write!(f, "{}: {}", prefix, err)
    }
}
