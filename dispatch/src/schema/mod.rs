//! Validation of engine responses against the fixed route and table schemas.
//!
//! A response that cannot be read as the expected structure fails only its own row. The raw
//! body always stays next to the outcome, so callers can tell an empty `routes` collection (the
//! engine found nothing) from a body that does not match the schema at all.

mod route;
mod table;

pub use route::{Route, RouteGeometry, RouteLeg, RouteResponse, RouteStep};
pub use table::TableResponse;

use crate::client::RawResponse;
use crate::matrix::MatrixError;
use common::types::Coordinate;
use polars::error::PolarsResult;
use polars::prelude::Column;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointKind {
    Route,
    Table,
}

/// Snapped input point, as found in `waypoints`, `sources` and `destinations`
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Waypoint {
    #[serde(default)]
    pub hint: String,
    /// Distance in meters from the input coordinate to the snapped location
    pub distance: f64,
    #[serde(default)]
    pub name: String,
    pub location: Coordinate,
}

pub trait ResponseSchema: DeserializeOwned {
    const KIND: EndpointKind;

    fn code(&self) -> &str;

    /// Checks that go beyond field presence and types
    fn check_shape(&self) -> Result<(), ParseError> {
        Ok(())
    }
}

/// Either of the two response kinds, for callers that pick the kind at runtime
#[derive(Debug, Clone, PartialEq)]
pub enum AnyResponse {
    Route(RouteResponse),
    Table(TableResponse),
}

impl AnyResponse {
    pub fn code(&self) -> &str {
        match self {
            AnyResponse::Route(response) => response.code(),
            AnyResponse::Table(response) => response.code(),
        }
    }
}

pub fn parse<T: ResponseSchema>(raw: &str) -> Result<T, ParseError> {
    let value: Value = serde_json::from_str(raw).map_err(ParseError::InvalidJson)?;

    let code = match value.get("code") {
        Some(Value::String(code)) => code.clone(),
        _ => return Err(ParseError::MissingCode),
    };
    let message = value.get("message").and_then(Value::as_str).map(str::to_string);

    let response: T = serde_json::from_value(value)
        .map_err(|source| ParseError::SchemaMismatch { kind: T::KIND, code, message, source })?;
    response.check_shape()?;

    Ok(response)
}

pub fn parse_kind(raw: &str, kind: EndpointKind) -> Result<AnyResponse, ParseError> {
    match kind {
        EndpointKind::Route => parse::<RouteResponse>(raw).map(AnyResponse::Route),
        EndpointKind::Table => parse::<TableResponse>(raw).map(AnyResponse::Table),
    }
}

/// Classifies one dispatched call. The engine answers every code but `Ok` with HTTP 400, so an
/// error status only counts as a transport failure if the body carries no engine `code`.
pub fn validate<T: ResponseSchema>(response: &RawResponse) -> Result<T, RowError> {
    let Some(status) = response.status else {
        return Err(RowError::TransportFailure { status: None, message: response.body.clone() });
    };

    match parse::<T>(&response.body) {
        Err(ParseError::InvalidJson(_) | ParseError::MissingCode) if !response.success => {
            Err(RowError::TransportFailure {
                status: Some(status),
                message: format!("engine answered with HTTP {status}: {}", response.body),
            })
        }
        outcome => outcome.map_err(RowError::SchemaMismatch),
    }
}

/// Validates an already assembled column of raw response strings. Null cells stay null.
pub fn validate_column(
    column: &Column,
    kind: EndpointKind,
) -> PolarsResult<Vec<Option<Result<AnyResponse, ParseError>>>> {
    let outcomes = column.str()?
        .iter()
        .map(|raw| raw.map(|raw| parse_kind(raw, kind)))
        .collect();

    Ok(outcomes)
}

#[derive(thiserror::Error, Debug)]
pub enum ParseError {
    InvalidJson(serde_json::Error),
    MissingCode,
    SchemaMismatch {
        kind: EndpointKind,
        code: String,
        /// The engine's own explanation, if it gave one
        message: Option<String>,
        source: serde_json::Error,
    },
    ShapeMismatch {
        what: &'static str,
        expected: (usize, usize),
        found: (usize, usize),
    },
    Matrix(#[from] MatrixError),
}

impl Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ParseError::InvalidJson(err) => write!(f, "Response is not JSON: {err}"),
            ParseError::MissingCode => write!(f, "Response has no `code` field"),
            ParseError::SchemaMismatch { kind, code, message: Some(message), source } => write!(
                f,
                "{kind:?} response with code '{code}' ({message}) does not match the schema: {source}"
            ),
            ParseError::SchemaMismatch { kind, code, message: None, source } => {
                write!(f, "{kind:?} response with code '{code}' does not match the schema: {source}")
            }
            ParseError::ShapeMismatch { what, expected, found } => write!(
                f,
                "Expected {what} of shape {}x{}, found {}x{}",
                expected.0, expected.1, found.0, found.1
            ),
            ParseError::Matrix(err) => write!(f, "Unusable matrix: {err}"),
        }
    }
}

/// Why a single row has no structured value. Never aborts the batch.
#[derive(thiserror::Error, Debug)]
pub enum RowError {
    TransportFailure {
        status: Option<u16>,
        message: String,
    },
    SchemaMismatch(#[from] ParseError),
}

impl RowError {
    pub fn kind(&self) -> &'static str {
        match self {
            RowError::TransportFailure { .. } => "TransportFailure",
            RowError::SchemaMismatch(_) => "SchemaMismatch",
        }
    }
}

impl Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RowError::TransportFailure { message, .. } => write!(f, "Transport failure: {message}"),
            RowError::SchemaMismatch(err) => write!(f, "Schema mismatch: {err}"),
        }
    }
}
