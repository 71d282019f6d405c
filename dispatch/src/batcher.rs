use crate::requests::{RouteRequest, TableRequest};
use common::types::config::jobs::RouteColumnNames;
use common::types::options::{RouteOptions, TableOptions};
use common::types::Coordinate;
use common::util::df::f64_values;
use common::util::duration::Seconds;
use hashbrown::HashSet;
use itertools::izip;
use polars::error::PolarsResult;
use polars::frame::DataFrame;
use polars::prelude::{polars_bail, DataType, TimeUnit};
use std::collections::BTreeMap;
use std::fmt;
use std::fmt::Display;
use std::sync::Arc;

/// Borrowed coordinate columns of one partition, row-aligned
#[derive(Debug, Clone, Copy)]
pub struct RouteColumns<'a> {
    pub start_lon: &'a [f64],
    pub start_lat: &'a [f64],
    pub end_lon: &'a [f64],
    pub end_lat: &'a [f64],
}

#[derive(Debug, Clone, PartialEq)]
pub struct OwnedRouteColumns {
    pub start_lon: Vec<f64>,
    pub start_lat: Vec<f64>,
    pub end_lon: Vec<f64>,
    pub end_lat: Vec<f64>,
}

impl OwnedRouteColumns {
    pub fn as_columns(&self) -> RouteColumns<'_> {
        RouteColumns {
            start_lon: &self.start_lon,
            start_lat: &self.start_lat,
            end_lon: &self.end_lon,
            end_lat: &self.end_lat,
        }
    }
}

fn check_len(column: &str, expected: usize, found: usize) -> Result<(), InputMismatch> {
    if expected != found {
        return Err(InputMismatch { column: column.to_string(), expected, found });
    }
    Ok(())
}

/// One request per row, in row order. The request index is the row position.
pub fn to_requests(
    columns: RouteColumns,
    options: &Arc<RouteOptions>,
) -> Result<Vec<RouteRequest>, InputMismatch> {
    let rows = columns.start_lon.len();
    check_len("start_lat", rows, columns.start_lat.len())?;
    check_len("end_lon", rows, columns.end_lon.len())?;
    check_len("end_lat", rows, columns.end_lat.len())?;

    let requests = izip!(columns.start_lon, columns.start_lat, columns.end_lon, columns.end_lat)
        .enumerate()
        .map(|(index, (&start_lon, &start_lat, &end_lon, &end_lat))| RouteRequest {
            index,
            origin: Coordinate::new(start_lon, start_lat),
            destination: Coordinate::new(end_lon, end_lat),
            options: options.clone(),
        })
        .collect();

    Ok(requests)
}

/// Groups points by key into table requests.
///
/// Duplicate points within a group are collapsed, keeping the order in which they were first
/// seen. Rows without a key belong to no group. Groups left with fewer than two points are
/// dropped, since a matrix needs at least two.
pub fn to_grouped_requests<K: Ord + Clone>(
    keys: &[Option<K>],
    points: &[Coordinate],
    options: &TableOptions,
) -> Result<BTreeMap<K, TableRequest>, InputMismatch> {
    check_len("points", keys.len(), points.len())?;

    let mut groups: BTreeMap<K, (HashSet<_>, Vec<Coordinate>)> = BTreeMap::new();
    for (key, point) in keys.iter().zip(points) {
        let Some(key) = key else { continue };

        let (seen, group) = groups.entry(key.clone()).or_default();
        if seen.insert(point.key()) {
            group.push(*point);
        }
    }

    let requests = groups.into_iter()
        .filter_map(|(key, (_, group))| {
            TableRequest::try_new(group, options.clone()).map(|request| (key, request))
        })
        .collect();

    Ok(requests)
}

pub fn route_columns_from_frame(frame: &DataFrame, names: &RouteColumnNames) -> PolarsResult<OwnedRouteColumns> {
    Ok(OwnedRouteColumns {
        start_lon: f64_values(frame, &names.start_lon)?,
        start_lat: f64_values(frame, &names.start_lat)?,
        end_lon: f64_values(frame, &names.end_lon)?,
        end_lat: f64_values(frame, &names.end_lat)?,
    })
}

pub fn points_from_frame(frame: &DataFrame, lon: &str, lat: &str) -> PolarsResult<Vec<Coordinate>> {
    let points = f64_values(frame, lon)?
        .into_iter()
        .zip(f64_values(frame, lat)?)
        .map(|(lon, lat)| Coordinate::new(lon, lat))
        .collect();

    Ok(points)
}

/// Start of the time window (epoch milliseconds) each row falls into. Null times have no window.
pub fn window_keys_from_frame(frame: &DataFrame, time_column: &str, window: Seconds) -> PolarsResult<Vec<Option<i64>>> {
    let column = frame.column(time_column)?;
    let per_milli = match column.dtype() {
        DataType::Datetime(TimeUnit::Nanoseconds, _) => 1_000_000,
        DataType::Datetime(TimeUnit::Microseconds, _) => 1_000,
        DataType::Datetime(TimeUnit::Milliseconds, _) => 1,
        other => polars_bail!(SchemaMismatch: "column '{}' must be a datetime, found {}", time_column, other),
    };
    let window_ms = window.as_millis().max(1);

    let keys = column.cast(&DataType::Int64)?
        .i64()?
        .iter()
        .map(|value| value.map(|value| value.div_euclid(per_milli).div_euclid(window_ms) * window_ms))
        .collect();

    Ok(keys)
}

/// Columns handed to the batcher disagree in length. Always a caller bug.
#[derive(thiserror::Error, Debug, PartialEq)]
pub struct InputMismatch {
    pub column: String,
    pub expected: usize,
    pub found: usize,
}

impl Display for InputMismatch {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Column '{}' has {} values, expected {}",
            self.column, self.found, self.expected
        )
    }
}
