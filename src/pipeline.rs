use crate::RouteshardError;
use common::types::config::jobs::{RouteJobConfig, TableJobConfig};
use common::types::config::{EngineConfig, OutputConfig, OutputFormat};
use common::types::dataset::TripDataset;
use common::util::df::{write_df_to_file, write_geoarrow_to_file};
use common::util::logging;
use data_harvester::step1_fetch::fetch_dataset;
use data_harvester::step2_import::import_data;
use data_harvester::step3_prepare::{prepare, PrepareStepOutput};
use dispatch::batcher::{points_from_frame, to_grouped_requests, window_keys_from_frame};
use dispatch::client::OsrmClient;
use dispatch::enrich::{enrich_routes, enrich_tables};
use dispatch::geometry::build_route_lines;
use dispatch::locator::{discover_endpoints, resolver_from_config, verify_all, Locality};
use dispatch::matrix::Grid;
use dispatch::pool::ExecutionPool;
use geoarrow::error::GeoArrowError;
use log::{info, warn};
use polars::error::PolarsError;
use polars::frame::DataFrame;
use std::fmt;
use std::fmt::Display;
use std::path::PathBuf;
use std::time::SystemTime;
use tokio::runtime::Runtime;

/// Everything a run needs, taken apart from the versioned config
pub struct Jobs {
    pub engine: EngineConfig,
    pub dataset: TripDataset,
    pub routes: RouteJobConfig,
    pub tables: TableJobConfig,
    pub output: OutputConfig,
}

pub fn run(jobs: Jobs) -> Result<(), RouteshardError> {
    let Jobs { engine, dataset, routes, tables, output } = jobs;
    let start_time = SystemTime::now();

    let pool = ExecutionPool::new(engine.execution_units)?;
    let locality = Locality::new(resolver_from_config(&engine.resolver), engine.port);
    let client = OsrmClient::from_config(&engine)?;
    info!(
        target: "main",
        "Using {} execution unit(s), profile '{}', timeout {}s",
        pool.units(), client.profile(), engine.request_timeout.0
    );

    check_deployment(&pool, &locality, &client, &engine)?;

    let PrepareStepOutput { dataset, frame } = load_trips(dataset)?;
    let output = Output::new(&output, &dataset.id);

    if routes.enabled {
        let batch = enrich_routes(
            &pool,
            &locality,
            &client,
            &frame,
            &routes.columns,
            routes.options,
            engine.rows_per_partition,
        )?;

        let routed = batch.attach_to(&frame)?;
        output.write_frame("routes", routed)?;

        if output.route_lines {
            let table = logging::run_with_spinner("output", "Building route lines", || build_route_lines(&batch.rows))?;
            output.write_lines("route_lines", table)?;
        }
    }

    if tables.enabled {
        let keys = window_keys_from_frame(&frame, &tables.time, tables.window)?;
        let points = points_from_frame(&frame, &tables.lon, &tables.lat)?;
        let groups = to_grouped_requests(&keys, &points, &tables.options)?;
        info!(target: "main", "Built {} table request(s) from {} point(s)", groups.len(), points.len());

        let batch = enrich_tables(&pool, &locality, &client, groups)?;
        if let Some(durations) = batch.first_durations() {
            info!(target: "main", "Durations of the first window (seconds):\n{}", Grid(durations));
        }

        output.write_frame("tables", batch.to_frame()?)?;
    }

    let elapsed = indicatif::HumanDuration(start_time.elapsed().unwrap_or_default());
    info!(target: "main", "Finished in {}", elapsed);

    Ok(())
}

/// Finds the engines next to the execution units and probes each one. Unhealthy engines only
/// abort the run if the config asks for it.
fn check_deployment(
    pool: &ExecutionPool,
    locality: &Locality,
    client: &OsrmClient,
    engine: &EngineConfig,
) -> Result<(), RouteshardError> {
    let endpoints = discover_endpoints(pool, locality)?;
    let report = logging::run_with_spinner("locator", "Probing engines", || {
        verify_all(client, &endpoints, &engine.probe)
    });

    for (endpoint, status) in &report {
        if status.is_reachable() {
            info!(target: "locator", "{}: {}", endpoint, status);
        } else {
            warn!(target: "locator", "{}: {}", endpoint, status);
        }
    }

    let unreachable = report.iter().filter(|(_, status)| !status.is_reachable()).count();
    if unreachable > 0 && engine.require_healthy {
        return Err(RouteshardError::Unhealthy { unreachable, total: report.len() });
    }

    Ok(())
}

fn load_trips(dataset: TripDataset) -> Result<PrepareStepOutput, RouteshardError> {
    let fetched = logging::run_with_spinner("harvest", "Fetching dataset", || {
        let rt = Runtime::new()?;
        let fetched = rt.block_on(fetch_dataset(dataset))?;
        Ok::<_, RouteshardError>(fetched)
    })?;

    logging::run_with_spinner("harvest", "Importing and preparing trips", || {
        let imported = import_data(fetched)?;
        Ok::<_, RouteshardError>(prepare(imported)?)
    })
}

struct Output {
    directory: PathBuf,
    format: OutputFormat,
    route_lines: bool,
    dataset_id: String,
}

impl Output {
    fn new(config: &OutputConfig, dataset_id: &str) -> Self {
        Self {
            directory: PathBuf::from(&config.directory),
            format: config.format,
            route_lines: config.route_lines,
            dataset_id: dataset_id.to_string(),
        }
    }

    fn path(&self, name: &str, extension: &str) -> PathBuf {
        self.directory.join(format!("{}_{}.{}", self.dataset_id, name, extension))
    }

    fn write_frame(&self, name: &str, frame: DataFrame) -> Result<(), OutputError> {
        let frame = match self.format {
            OutputFormat::Csv => flatten_for_csv(frame),
            _ => frame,
        };
        let path = self.path(name, self.format.extension());

        write_df_to_file(path.clone(), self.format, frame)?;
        info!(target: "output", "Wrote {}", path.display());
        Ok(())
    }

    fn write_lines(&self, name: &str, table: geoarrow::table::Table) -> Result<(), OutputError> {
        let path = self.path(name, "arrow");

        write_geoarrow_to_file(path.clone(), table)?;
        info!(target: "output", "Wrote {}", path.display());
        Ok(())
    }
}

/// CSV has no nested values. Matrices are left out; the raw table response still holds them.
fn flatten_for_csv(frame: DataFrame) -> DataFrame {
    let nested = frame.get_columns()
        .iter()
        .filter(|column| column.dtype().is_nested())
        .map(|column| column.name().clone())
        .collect::<Vec<_>>();

    if nested.is_empty() {
        return frame;
    }

    warn!(target: "output", "Leaving out nested column(s) {:?} in CSV output", nested);
    frame.drop_many(nested)
}

#[derive(thiserror::Error, Debug)]
pub enum OutputError {
    Polars(#[from] PolarsError),
    GeoArrow(#[from] GeoArrowError),
}

impl Display for OutputError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let err: &dyn Display = match self {
            OutputError::Polars(err) => err,
            OutputError::GeoArrow(err) => err,
        };
        write!(f, "{}", err)
    }
}
