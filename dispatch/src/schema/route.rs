use crate::schema::{EndpointKind, ResponseSchema, Waypoint};
use common::types::Coordinate;
use geo::LineString;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RouteResponse {
    pub code: String,
    pub routes: Vec<Route>,
    pub waypoints: Vec<Waypoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RouteResponse {
    pub fn is_ok(&self) -> bool {
        self.code == "Ok"
    }

    /// The engine wraps its single best route in a collection. Further elements are alternatives
    /// only if they were asked for.
    pub fn primary_route(&self) -> Option<&Route> {
        self.routes.first()
    }
}

impl ResponseSchema for RouteResponse {
    const KIND: EndpointKind = EndpointKind::Route;

    fn code(&self) -> &str {
        &self.code
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Route {
    /// meters
    pub distance: f64,
    /// seconds
    pub duration: f64,
    /// Left out by the engine with `overview=false`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<RouteGeometry>,
    pub legs: Vec<RouteLeg>,
    pub weight: f64,
    pub weight_name: String,
}

/// GeoJSON LineString, as requested with `geometries=geojson`
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RouteGeometry {
    #[serde(rename = "type")]
    pub kind: String,
    pub coordinates: Vec<Coordinate>,
}

impl RouteGeometry {
    /// Serialized form handed to geometry conversion
    pub fn to_geojson(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn to_line_string(&self) -> LineString<f64> {
        LineString::new(self.coordinates.iter().map(|&c| c.into()).collect())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RouteLeg {
    pub distance: f64,
    pub duration: f64,
    pub weight: f64,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub steps: Vec<RouteStep>,
}

/// Turn-by-turn step. Only present with `steps=true`; fields beyond these are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RouteStep {
    pub distance: f64,
    pub duration: f64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub mode: String,
}
