//! Per-partition pipeline: batch rows into requests, call the local engine one request at a time,
//! re-attach the responses in order and validate them. Partitions run in parallel on the pool.

use crate::assembler::attach;
use crate::batcher::{route_columns_from_frame, to_requests, RouteColumns};
use crate::client::{OsrmClient, RawResponse};
use crate::errors::DispatchError;
use crate::locator::Locality;
use crate::matrix::{extract_distances, extract_durations, CostMatrix};
use crate::pool::{ExecutionPool, PartitionContext};
use crate::requests::{RouteRequest, TableRequest};
use crate::schema::{validate, ParseError, Route, RouteGeometry, RouteResponse, RowError, TableResponse};
use common::types::config::jobs::RouteColumnNames;
use common::types::options::RouteOptions;
use common::util::df::slices;
use common::util::logging::run_with_pb;
use itertools::Itertools;
use log::{debug, info};
use polars::error::PolarsResult;
use polars::frame::DataFrame;
use polars::prelude::{polars_ensure, polars_err, Column, DataType, NamedFrom, PlSmallStr, Series, TimeUnit};
use std::collections::BTreeMap;
use std::sync::Arc;

/// One input row after dispatch. The raw response is always there, even when `outcome` failed.
#[derive(Debug)]
pub struct RouteRow {
    /// Row position in the whole frame
    pub index: usize,
    pub request: RouteRequest,
    pub raw: RawResponse,
    pub outcome: Result<RouteResponse, RowError>,
}

impl RouteRow {
    pub fn route(&self) -> Option<&Route> {
        self.outcome.as_ref().ok().and_then(RouteResponse::primary_route)
    }
}

/// Runs one partition on the calling unit. `offset` is the position of the partition's first
/// row in the whole frame.
pub fn route_partition(
    client: &OsrmClient,
    context: &PartitionContext,
    offset: usize,
    columns: RouteColumns,
    options: &Arc<RouteOptions>,
) -> Result<Vec<RouteRow>, DispatchError> {
    let requests = to_requests(columns, options)?;
    let responses = requests.iter()
        .map(|request| client.dispatch(request, &context.endpoint))
        .collect();

    let rows = attach(requests, responses)?
        .into_iter()
        .map(|row| RouteRow {
            index: offset + row.index,
            outcome: validate::<RouteResponse>(&row.response),
            request: row.request,
            raw: row.response,
        })
        .collect::<Vec<_>>();

    debug!(
        target: "dispatch",
        "Partition {} on unit {:?}: {} route(s) from {}",
        context.partition, context.unit, rows.len(), context.endpoint
    );
    Ok(rows)
}

pub fn enrich_routes(
    pool: &ExecutionPool,
    locality: &Locality,
    client: &OsrmClient,
    frame: &DataFrame,
    names: &RouteColumnNames,
    options: RouteOptions,
    rows_per_partition: usize,
) -> Result<RouteBatch, DispatchError> {
    let options = Arc::new(options);
    let partitions = slices(frame, rows_per_partition);

    let rows = run_with_pb("dispatch", "Dispatching routes", partitions.len() as u64, true, |pb| {
        pool.map_partitions(locality, partitions, |context, (offset, slice)| {
            let columns = route_columns_from_frame(&slice, names)?;
            let rows = route_partition(client, context, offset, columns.as_columns(), &options)?;
            pb.inc(1);
            Ok::<_, DispatchError>(rows)
        })
    })?;

    let batch = RouteBatch { rows: rows.into_iter().flatten().collect() };
    info!(target: "dispatch", "{} route(s), {} failed", batch.rows.len(), batch.failures().count());
    Ok(batch)
}

/// All rows of a frame after route dispatch, in frame order
#[derive(Debug)]
pub struct RouteBatch {
    pub rows: Vec<RouteRow>,
}

impl RouteBatch {
    pub fn failures(&self) -> impl Iterator<Item = &RouteRow> {
        self.rows.iter().filter(|row| row.outcome.is_err())
    }

    /// Output columns, one value per row. `osrm_route` is never null.
    pub fn to_columns(&self) -> PolarsResult<Vec<Column>> {
        let raw = self.rows.iter().map(|row| row.raw.body.as_str()).collect_vec();
        let code = self.rows.iter().map(|row| row.outcome.as_ref().ok().map(|r| r.code.as_str())).collect_vec();
        let error_kind = self.rows.iter().map(|row| row.outcome.as_ref().err().map(RowError::kind)).collect_vec();
        let error = self.rows.iter().map(|row| row.outcome.as_ref().err().map(RowError::to_string)).collect_vec();
        let meters = self.rows.iter().map(|row| row.route().map(|route| route.distance)).collect_vec();
        let seconds = self.rows.iter().map(|row| row.route().map(|route| route.duration)).collect_vec();
        let geojson = self.rows.iter()
            .map(|row| row.route().and_then(|route| route.geometry.as_ref()).map(RouteGeometry::to_geojson).transpose())
            .collect::<serde_json::Result<Vec<_>>>()
            .map_err(|err| polars_err!(ComputeError: "could not serialize route geometry: {}", err))?;

        Ok(vec![
            Series::new("osrm_route".into(), raw).into(),
            Series::new("osrm_code".into(), code).into(),
            Series::new("osrm_error_kind".into(), error_kind).into(),
            Series::new("osrm_error".into(), error).into(),
            Series::new("route_meters".into(), meters).into(),
            Series::new("route_seconds".into(), seconds).into(),
            Series::new("route_geojson".into(), geojson).into(),
        ])
    }

    /// Appends the output columns to the frame the rows came from
    pub fn attach_to(&self, frame: &DataFrame) -> PolarsResult<DataFrame> {
        polars_ensure!(
            frame.height() == self.rows.len(),
            ShapeMismatch: "frame has {} rows, but {} were dispatched", frame.height(), self.rows.len()
        );
        frame.hstack(&self.to_columns()?)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableOutcome {
    pub response: TableResponse,
    pub durations: CostMatrix,
    pub distances: Option<CostMatrix>,
}

/// One group after dispatch
#[derive(Debug)]
pub struct TableRow<K> {
    pub key: K,
    pub request: TableRequest,
    pub raw: RawResponse,
    pub outcome: Result<TableOutcome, RowError>,
}

impl<K> TableRow<K> {
    pub fn table(&self) -> Option<&TableOutcome> {
        self.outcome.as_ref().ok()
    }
}

fn table_outcome(raw: &RawResponse) -> Result<TableOutcome, RowError> {
    let response = validate::<TableResponse>(raw)?;
    let durations = extract_durations(&response).map_err(ParseError::from)?;
    let distances = extract_distances(&response).map_err(ParseError::from)?;

    Ok(TableOutcome { response, durations, distances })
}

pub fn table_partition<K>(
    client: &OsrmClient,
    context: &PartitionContext,
    groups: Vec<(K, TableRequest)>,
) -> Result<Vec<TableRow<K>>, DispatchError> {
    let (keys, requests): (Vec<_>, Vec<_>) = groups.into_iter().unzip();
    let responses = requests.iter()
        .map(|request| client.dispatch(request, &context.endpoint))
        .collect();

    let rows = keys.into_iter()
        .zip(attach(requests, responses)?)
        .map(|(key, row)| TableRow {
            key,
            outcome: table_outcome(&row.response),
            request: row.request,
            raw: row.response,
        })
        .collect::<Vec<_>>();

    debug!(
        target: "dispatch",
        "Partition {} on unit {:?}: {} table(s) from {}",
        context.partition, context.unit, rows.len(), context.endpoint
    );
    Ok(rows)
}

/// Dispatches one table request per group. Groups are spread over the units in contiguous runs,
/// so results come back in key order.
pub fn enrich_tables<K>(
    pool: &ExecutionPool,
    locality: &Locality,
    client: &OsrmClient,
    groups: BTreeMap<K, TableRequest>,
) -> Result<TableBatch<K>, DispatchError>
where
    K: Ord + Send,
{
    let per_partition = groups.len().div_ceil(pool.units()).max(1);
    let partitions = groups.into_iter()
        .chunks(per_partition)
        .into_iter()
        .map(|chunk| chunk.collect_vec())
        .collect_vec();

    let rows = run_with_pb("dispatch", "Dispatching tables", partitions.len() as u64, true, |pb| {
        pool.map_partitions(locality, partitions, |context, groups| {
            let rows = table_partition(client, context, groups)?;
            pb.inc(1);
            Ok::<_, DispatchError>(rows)
        })
    })?;

    let batch = TableBatch { rows: rows.into_iter().flatten().collect() };
    info!(target: "dispatch", "{} table(s), {} failed", batch.rows.len(), batch.failures().count());
    Ok(batch)
}

#[derive(Debug)]
pub struct TableBatch<K> {
    pub rows: Vec<TableRow<K>>,
}

impl<K> TableBatch<K> {
    pub fn failures(&self) -> impl Iterator<Item = &TableRow<K>> {
        self.rows.iter().filter(|row| row.outcome.is_err())
    }

    /// First successfully extracted duration matrix
    pub fn first_durations(&self) -> Option<&CostMatrix> {
        self.rows.iter().find_map(|row| row.table().map(|outcome| &outcome.durations))
    }
}

fn matrix_series(matrix: &CostMatrix) -> Series {
    let rows = matrix.rows()
        .into_iter()
        .map(|row| Series::new(PlSmallStr::EMPTY, row.to_vec()))
        .collect_vec();
    Series::new(PlSmallStr::EMPTY, rows)
}

impl TableBatch<i64> {
    /// One output row per time window
    pub fn to_frame(&self) -> PolarsResult<DataFrame> {
        let window_start = Series::new("window_start".into(), self.rows.iter().map(|row| row.key).collect_vec())
            .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?;
        let point_count = self.rows.iter().map(|row| row.request.len() as u32).collect_vec();
        let points = self.rows.iter().map(|row| row.request.points().iter().join(";")).collect_vec();
        let raw = self.rows.iter().map(|row| row.raw.body.as_str()).collect_vec();
        let code = self.rows.iter().map(|row| row.table().map(|o| o.response.code.as_str())).collect_vec();
        let error_kind = self.rows.iter().map(|row| row.outcome.as_ref().err().map(RowError::kind)).collect_vec();
        let error = self.rows.iter().map(|row| row.outcome.as_ref().err().map(RowError::to_string)).collect_vec();
        let durations = self.rows.iter()
            .map(|row| row.table().map(|o| matrix_series(&o.durations)))
            .collect_vec();
        let distances = self.rows.iter()
            .map(|row| row.table().and_then(|o| o.distances.as_ref()).map(matrix_series))
            .collect_vec();

        DataFrame::new(vec![
            window_start.into(),
            Series::new("point_count".into(), point_count).into(),
            Series::new("points".into(), points).into(),
            Series::new("driving_table".into(), raw).into(),
            Series::new("osrm_code".into(), code).into(),
            Series::new("osrm_error_kind".into(), error_kind).into(),
            Series::new("osrm_error".into(), error).into(),
            Series::new("durations".into(), durations).into(),
            Series::new("distances".into(), distances).into(),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batcher::{points_from_frame, to_grouped_requests, window_keys_from_frame};
    use crate::locator::FixedResolver;
    use crate::tests::{spawn_fake_engine, EMPTY_ROUTES_ORIGIN, HTTP_500_ORIGIN, NO_ROUTE_BODY, NO_ROUTE_ORIGIN};
    use common::types::options::TableOptions;
    use common::types::Coordinate;
    use common::util::duration::Seconds;
    use polars::df;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    fn client() -> OsrmClient {
        OsrmClient::new("driving", Duration::from_secs(5), Duration::from_secs(1)).unwrap()
    }

    fn locality(port: u16) -> Locality {
        Locality::new(Arc::new(FixedResolver::loopback()), port)
    }

    #[test]
    fn test_enrich_routes_keeps_rows_aligned() {
        let engine = spawn_fake_engine();
        let pool = ExecutionPool::new(Some(2)).unwrap();

        let frame = df!(
            "trip_id" => [0u32, 1, 2, 3, 4, 5, 6],
            "pickup_longitude" => [-74.005310, NO_ROUTE_ORIGIN.lon, -73.99, HTTP_500_ORIGIN.lon, EMPTY_ROUTES_ORIGIN.lon, -73.95, -73.98],
            "pickup_latitude" => [Some(40.708750), Some(NO_ROUTE_ORIGIN.lat), Some(40.73), Some(HTTP_500_ORIGIN.lat), Some(EMPTY_ROUTES_ORIGIN.lat), None, Some(40.76)],
            "dropoff_longitude" => [-73.978691, -73.9, -73.97, -73.9, -73.9, -73.9, -74.0],
            "dropoff_latitude" => [40.744850, 40.7, 40.75, 40.7, 40.7, 40.7, 40.7],
        ).unwrap();

        let batch = enrich_routes(
            &pool,
            &locality(engine.endpoint.port),
            &client(),
            &frame,
            &RouteColumnNames::default(),
            RouteOptions::default(),
            3,
        ).unwrap();

        assert_eq!(batch.rows.len(), frame.height());
        assert_eq!(engine.calls.load(Ordering::SeqCst), frame.height());
        for (i, row) in batch.rows.iter().enumerate() {
            assert_eq!(row.index, i);
            assert!(!row.raw.body.is_empty());
        }
        assert_eq!(batch.rows[3].request.origin, HTTP_500_ORIGIN);

        let kinds = batch.rows.iter()
            .map(|row| row.outcome.as_ref().err().map(RowError::kind))
            .collect_vec();
        assert_eq!(kinds, vec![
            None,
            Some("SchemaMismatch"),
            None,
            Some("TransportFailure"),
            None,
            // The null latitude is rejected by the engine with its own code
            Some("SchemaMismatch"),
            None,
        ]);
        assert_eq!(batch.failures().count(), 3);

        // Geometry of the scenario route stays within valid ranges
        let route = batch.rows[0].outcome.as_ref().unwrap().primary_route().unwrap();
        assert!(route.geometry.as_ref().unwrap().coordinates.iter().all(Coordinate::is_within_bounds));

        let out = batch.attach_to(&frame).unwrap();
        assert_eq!(out.height(), frame.height());
        assert_eq!(out.column("osrm_route").unwrap().null_count(), 0);
        assert_eq!(out.column("route_meters").unwrap().null_count(), 4);
        assert_eq!(out.column("osrm_code").unwrap().str().unwrap().get(4), Some("Ok"));
        assert_eq!(out.column("osrm_route").unwrap().str().unwrap().get(1), Some(NO_ROUTE_BODY));
        assert!(out.column("route_geojson").unwrap().str().unwrap().get(0).unwrap().starts_with(r#"{"type":"LineString""#));
    }

    #[test]
    fn test_attach_to_other_frame_fails() {
        let batch = RouteBatch { rows: vec![] };
        let frame = df!("a" => [1, 2]).unwrap();
        assert!(batch.attach_to(&frame).is_err());
    }

    #[test]
    fn test_enrich_tables() {
        let engine = spawn_fake_engine();
        let pool = ExecutionPool::new(Some(2)).unwrap();

        let times = Series::new(
            "pickup_datetime".into(),
            [0i64, 200, 400, 1_100, 1_500, 2_100, 2_300, 3_000, 3_100, 3_900],
        ).cast(&DataType::Datetime(TimeUnit::Milliseconds, None)).unwrap();
        let lon = Series::new("pickup_longitude".into(), [-74.0, -73.99, -73.98, -73.97, -73.97, -73.96, -73.95, -73.94, -73.93, -73.92]);
        let lat = Series::new("pickup_latitude".into(), [40.70, 40.71, 40.72, 40.73, 40.73, 40.74, 40.75, 40.76, 40.77, 40.78]);
        let frame = DataFrame::new(vec![times.into(), lon.into(), lat.into()]).unwrap();

        let keys = window_keys_from_frame(&frame, "pickup_datetime", Seconds(1.0)).unwrap();
        let points = points_from_frame(&frame, "pickup_longitude", "pickup_latitude").unwrap();
        let groups = to_grouped_requests(&keys, &points, &TableOptions::default()).unwrap();
        // The window at 1s holds one point twice
        assert_eq!(groups.keys().copied().collect_vec(), vec![0, 2_000, 3_000]);

        let batch = enrich_tables(&pool, &locality(engine.endpoint.port), &client(), groups).unwrap();
        assert_eq!(engine.calls.load(Ordering::SeqCst), 3);
        assert_eq!(batch.failures().count(), 0);
        assert_eq!(batch.rows.iter().map(|row| row.key).collect_vec(), vec![0, 2_000, 3_000]);

        for row in &batch.rows {
            let outcome = row.outcome.as_ref().unwrap();
            let n = row.request.len();
            assert_eq!(outcome.durations.dim(), (n, n));
            assert_eq!(outcome.response.sources.len(), n);
            assert_eq!(outcome.response.destinations.len(), n);
            assert_eq!(outcome.distances.as_ref().unwrap().dim(), (n, n));
        }
        let first = batch.first_durations().unwrap();
        assert_ne!(first[[0, 1]], first[[1, 0]]);

        let out = batch.to_frame().unwrap();
        assert_eq!(out.height(), 3);
        assert_eq!(out.column("point_count").unwrap().u32().unwrap().get(0), Some(3));
        assert_eq!(out.column("durations").unwrap().null_count(), 0);
        assert_eq!(out.column("driving_table").unwrap().null_count(), 0);
    }
}
