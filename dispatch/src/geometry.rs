use crate::enrich::RouteRow;
use crate::schema::RouteGeometry;
use arrow_array::{ArrayRef, RecordBatch, UInt64Array};
use arrow_schema::{ArrowError, DataType, Field, Schema, SchemaRef};
use geoarrow::array::LineStringBuilder;
use geoarrow::datatypes::Dimension;
use geoarrow::error::GeoArrowError;
use geoarrow::table::Table;
use geoarrow::ArrayBase;
use std::fmt::Display;
use std::sync::Arc;

/// Route geometries as a GeoArrow line table, one line per row. Rows without a route, or routed
/// without an overview, get a null geometry, so `row_index` always matches the input frame.
pub fn build_route_lines(rows: &[RouteRow]) -> Result<Table, GeometryError> {
    let mut builder = LineStringBuilder::new(Dimension::XY);

    for row in rows {
        let line = row.route()
            .and_then(|route| route.geometry.as_ref())
            .map(RouteGeometry::to_line_string);
        builder.push_line_string(line.as_ref())?;
    }

    let array = builder.finish();
    let index_field = Arc::new(Field::new("row_index", DataType::UInt64, false));
    let schema: SchemaRef = Schema::new(vec![index_field, array.extension_field()]).into();

    let indices = UInt64Array::from_iter_values(rows.iter().map(|row| row.index as u64));
    let columns: Vec<ArrayRef> = vec![Arc::new(indices), array.into_array_ref()];
    let batch = RecordBatch::try_new(schema.clone(), columns)?;
    let table = Table::try_new(vec![batch], schema)?;

    Ok(table)
}

#[derive(thiserror::Error, Debug)]
pub enum GeometryError {
    Geoarrow(#[from] GeoArrowError),
    Arrow(#[from] ArrowError),
}

impl Display for GeometryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeometryError::Geoarrow(e) => e.fmt(f),
            GeometryError::Arrow(e) => e.fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::RawResponse;
    use crate::requests::RouteRequest;
    use crate::schema::{parse, RouteResponse, RowError};
    use common::types::options::RouteOptions;
    use common::types::Coordinate;
    use common::util::df::write_geoarrow_to_file;

    const ROUTE: &str = r#"{"code":"Ok","routes":[{"geometry":{"type":"LineString","coordinates":[[1.0,2.0],[1.5,2.5],[2.0,3.0]]},"legs":[],"weight_name":"routability","weight":1.0,"duration":1.0,"distance":10.0}],"waypoints":[]}"#;
    const ROUTE_WITHOUT_OVERVIEW: &str = r#"{"code":"Ok","routes":[{"legs":[],"weight_name":"routability","weight":1.0,"duration":1.0,"distance":10.0}],"waypoints":[]}"#;

    fn row(index: usize, outcome: Result<RouteResponse, RowError>) -> RouteRow {
        RouteRow {
            index,
            request: RouteRequest {
                index,
                origin: Coordinate::new(1.0, 2.0),
                destination: Coordinate::new(2.0, 3.0),
                options: Arc::new(RouteOptions::default()),
            },
            raw: RawResponse { body: String::new(), status: Some(200), success: true },
            outcome,
        }
    }

    #[test]
    fn test_build_route_lines() {
        let rows = vec![
            row(0, Ok(parse::<RouteResponse>(ROUTE).unwrap())),
            row(1, Err(RowError::TransportFailure { status: None, message: "refused".into() })),
            row(2, Ok(parse::<RouteResponse>(ROUTE).unwrap())),
            row(3, Ok(parse::<RouteResponse>(ROUTE_WITHOUT_OVERVIEW).unwrap())),
        ];

        let table = build_route_lines(&rows).unwrap();
        assert_eq!(table.len(), 4);
        assert_eq!(table.schema().fields().len(), 2);
        assert_eq!(table.schema().field(0).name(), "row_index");

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lines.arrow");
        write_geoarrow_to_file(path.clone(), table).unwrap();
        assert!(path.metadata().unwrap().len() > 0);
    }
}
