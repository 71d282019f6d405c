use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use url::Url;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TripDataset {
    pub id: String,
    pub src: DataSource,
    pub format: DatasetFormat,
    #[serde(default)]
    pub prepare: PrepareConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
pub enum DatasetFormat {
    #[serde(rename = "csv")]
    Csv,
    #[serde(rename = "parquet")]
    Parquet,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(
    untagged,
    expecting = "Invalid or missing data source. Specify either a remote source with `url:` and `headers:` or a local path with `path:` under `src:` of this dataset")
]
pub enum DataSource {
    URL {
        url: Url,
        #[serde(default)]
        headers: HashMap<String, String>,
    },
    File {
        path: String
    }
}

/// Row selection applied to the trip records before any request is built
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct PrepareConfig {
    /// Only keep trips that were under way at this instant (`pickup < t < dropoff`)
    pub spanning: Option<NaiveDateTime>,
    pub limit: Option<u32>,
    /// Derive `trip_meters` and `trip_seconds` from the taximeter columns, for comparison with the
    /// engine's numbers
    #[serde(default)]
    pub derive_ground_truth: bool,
}
