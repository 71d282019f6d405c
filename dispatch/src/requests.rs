use common::types::options::{RouteOptions, TableOptions};
use common::types::Coordinate;
use itertools::Itertools;
use std::fmt;
use std::fmt::Formatter;
use std::sync::Arc;

use crate::schema::EndpointKind;

/// Address of one routing engine instance
#[derive(Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self { host: host.into(), port }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        // IPv6 literals need brackets in URLs
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

/// Anything that goes over the wire as exactly one engine call
pub trait WireRequest {
    const KIND: EndpointKind;

    /// Path and query, relative to the engine's base URL
    fn path(&self, profile: &str) -> String;
}

/// One origin/destination pair. `index` is the row position in the partition it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteRequest {
    pub index: usize,
    pub origin: Coordinate,
    pub destination: Coordinate,
    pub options: Arc<RouteOptions>,
}

impl WireRequest for RouteRequest {
    const KIND: EndpointKind = EndpointKind::Route;

    fn path(&self, profile: &str) -> String {
        format!(
            "/route/v1/{}/{};{}?{}",
            profile,
            self.origin,
            self.destination,
            self.options.query_string()
        )
    }
}

/// Distinct points of one group; the engine answers with the matrix among all of them
#[derive(Debug, Clone, PartialEq)]
pub struct TableRequest {
    points: Vec<Coordinate>,
    options: TableOptions,
}

impl TableRequest {
    /// A matrix needs at least two points
    pub fn try_new(points: Vec<Coordinate>, options: TableOptions) -> Option<Self> {
        if points.len() < 2 {
            return None;
        }
        Some(Self { points, options })
    }

    pub fn points(&self) -> &[Coordinate] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl WireRequest for TableRequest {
    const KIND: EndpointKind = EndpointKind::Table;

    fn path(&self, profile: &str) -> String {
        let points = self.points.iter().join(";");
        match self.options.query_string() {
            Some(query) => format!("/table/v1/{}/{}?{}", profile, points, query),
            None => format!("/table/v1/{}/{}", profile, points),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_path() {
        let request = RouteRequest {
            index: 0,
            origin: Coordinate::new(-74.00531, 40.70875),
            destination: Coordinate::new(-73.978691, 40.74485),
            options: Arc::new(RouteOptions::default()),
        };

        assert_eq!(
            request.path("driving"),
            "/route/v1/driving/-74.00531,40.70875;-73.978691,40.74485?alternatives=true&steps=false&geometries=geojson&overview=simplified&annotations=false"
        );
    }

    #[test]
    fn test_table_path() {
        let points = vec![Coordinate::new(1.0, 2.0), Coordinate::new(3.5, 4.5), Coordinate::new(5.0, 6.0)];
        let request = TableRequest::try_new(points, TableOptions { distances: false }).unwrap();
        assert_eq!(request.path("driving"), "/table/v1/driving/1,2;3.5,4.5;5,6");

        let with_distances = TableRequest::try_new(request.points().to_vec(), TableOptions::default()).unwrap();
        assert_eq!(
            with_distances.path("car"),
            "/table/v1/car/1,2;3.5,4.5;5,6?annotations=duration,distance"
        );
    }

    #[test]
    fn test_table_request_needs_two_points() {
        assert!(TableRequest::try_new(vec![], TableOptions::default()).is_none());
        assert!(TableRequest::try_new(vec![Coordinate::new(1.0, 2.0)], TableOptions::default()).is_none());
        assert_eq!(
            TableRequest::try_new(vec![Coordinate::new(1.0, 2.0), Coordinate::new(1.0, 3.0)], TableOptions::default())
                .unwrap()
                .len(),
            2
        );
    }

    #[test]
    fn test_endpoint_url() {
        assert_eq!(Endpoint::new("127.0.0.1", 5000).base_url(), "http://127.0.0.1:5000");
        assert_eq!(Endpoint::new("::1", 5000).base_url(), "http://[::1]:5000");
    }
}
