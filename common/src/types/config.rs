pub mod jobs;

use crate::types::config::jobs::{RouteJobConfig, TableJobConfig};
use crate::types::dataset::TripDataset;
use crate::types::Coordinate;
use crate::util::duration::Seconds;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(tag = "version")]
pub enum Config {
    #[serde(rename = "1")]
    Version1 {
        #[serde(default)]
        engine: EngineConfig,
        dataset: TripDataset,
        #[serde(default)]
        routes: RouteJobConfig,
        #[serde(default)]
        tables: TableJobConfig,
        #[serde(default)]
        output: OutputConfig,
    }
}

/// Where the routing engines live and how they are called
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EngineConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_profile")]
    pub profile: String,
    #[serde(default)]
    pub resolver: ResolverConfig,
    #[serde(default = "default_request_timeout")]
    pub request_timeout: Seconds,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: Seconds,
    /// Number of parallel execution units. Defaults to the available parallelism.
    pub execution_units: Option<usize>,
    #[serde(default = "default_rows_per_partition")]
    pub rows_per_partition: usize,
    /// Abort the run if any discovered engine fails its health probe
    #[serde(default)]
    pub require_healthy: bool,
    #[serde(default)]
    pub probe: ProbeConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            profile: default_profile(),
            resolver: ResolverConfig::default(),
            request_timeout: default_request_timeout(),
            connect_timeout: default_connect_timeout(),
            execution_units: None,
            rows_per_partition: default_rows_per_partition(),
            require_healthy: false,
            probe: ProbeConfig::default(),
        }
    }
}

/// How an execution unit finds the address of its co-located engine
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(
    untagged,
    expecting = "Invalid resolver. Use `loopback`, `hostname` or `fixed: <host>`"
)]
pub enum ResolverConfig {
    Named(NamedResolver),
    Fixed { fixed: String },
}

impl Default for ResolverConfig {
    fn default() -> Self {
        ResolverConfig::Named(NamedResolver::Loopback)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum NamedResolver {
    Loopback,
    /// Ask the host for its address with `hostname -I`
    Hostname,
}

/// Fixed route query used to check that an engine answers
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProbeConfig {
    pub origin: Coordinate,
    pub destination: Coordinate,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            origin: Coordinate::new(-74.005310, 40.708750),
            destination: Coordinate::new(-73.978691, 40.744850),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct OutputConfig {
    #[serde(default = "default_output_directory")]
    pub directory: String,
    #[serde(default)]
    pub format: OutputFormat,
    /// Also write the route geometries as a GeoArrow line table
    #[serde(default)]
    pub route_lines: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_directory(),
            format: OutputFormat::default(),
            route_lines: false,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Csv,
    Ipc,
    #[default]
    Parquet,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Ipc => "arrow",
            OutputFormat::Parquet => "parquet",
        }
    }
}

fn default_port() -> u16 { 5000 }

fn default_profile() -> String { "driving".into() }

fn default_request_timeout() -> Seconds { Seconds(30.0) }

fn default_connect_timeout() -> Seconds { Seconds(5.0) }

fn default_rows_per_partition() -> usize { 1_000 }

fn default_output_directory() -> String { "./data/output".into() }
