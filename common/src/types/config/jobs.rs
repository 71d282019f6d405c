use crate::types::options::{RouteOptions, TableOptions};
use crate::util::duration::Seconds;
use serde::{Deserialize, Serialize};

/// Route mode: one route per trip, from pickup to dropoff
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RouteJobConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub columns: RouteColumnNames,
    #[serde(default)]
    pub options: RouteOptions,
}

impl Default for RouteJobConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            columns: RouteColumnNames::default(),
            options: RouteOptions::default(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct RouteColumnNames {
    pub start_lon: String,
    pub start_lat: String,
    pub end_lon: String,
    pub end_lat: String,
}

impl Default for RouteColumnNames {
    fn default() -> Self {
        Self {
            start_lon: "pickup_longitude".into(),
            start_lat: "pickup_latitude".into(),
            end_lon: "dropoff_longitude".into(),
            end_lat: "dropoff_latitude".into(),
        }
    }
}

/// Table mode: points are grouped into time windows and one duration matrix is built per window
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TableJobConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_point_lon")]
    pub lon: String,
    #[serde(default = "default_point_lat")]
    pub lat: String,
    #[serde(default = "default_time_column")]
    pub time: String,
    #[serde(default = "default_window")]
    pub window: Seconds,
    #[serde(default)]
    pub options: TableOptions,
}

impl Default for TableJobConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            lon: default_point_lon(),
            lat: default_point_lat(),
            time: default_time_column(),
            window: default_window(),
            options: TableOptions::default(),
        }
    }
}

fn default_true() -> bool { true }

fn default_point_lon() -> String { "pickup_longitude".into() }

fn default_point_lat() -> String { "pickup_latitude".into() }

fn default_time_column() -> String { "pickup_datetime".into() }

fn default_window() -> Seconds { Seconds(1.0) }
