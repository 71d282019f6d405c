use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::Formatter;

pub mod config;
pub mod dataset;
pub mod options;

/// A point on the map as the routing engine expects it: longitude first.
///
/// Values are not validated. Anything the engine cannot snap (out of range, NaN from a null cell)
/// is passed through and comes back as an engine error for that row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Coordinate {
    pub lon: f64,
    pub lat: f64,
}

impl Coordinate {
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    pub fn is_within_bounds(&self) -> bool {
        (-180.0..=180.0).contains(&self.lon) && (-90.0..=90.0).contains(&self.lat)
    }

    /// Hashable identity of a coordinate, used to collapse duplicate points
    pub fn key(&self) -> CoordinateKey {
        CoordinateKey(OrderedFloat(self.lon), OrderedFloat(self.lat))
    }
}

#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct CoordinateKey(OrderedFloat<f64>, OrderedFloat<f64>);

impl From<[f64; 2]> for Coordinate {
    fn from([lon, lat]: [f64; 2]) -> Self {
        Self { lon, lat }
    }
}

impl From<Coordinate> for [f64; 2] {
    fn from(value: Coordinate) -> Self {
        [value.lon, value.lat]
    }
}

impl From<Coordinate> for geo::Coord<f64> {
    fn from(value: Coordinate) -> Self {
        geo::coord! { x: value.lon, y: value.lat }
    }
}

// Formats the way the engine wants it inside a URL path: `lon,lat`
impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lon, self.lat)
    }
}
