use crate::schema::{EndpointKind, ParseError, ResponseSchema, Waypoint};
use serde::{Deserialize, Serialize};

/// Matrix answer for one group of points. Cells the engine could not route are `null`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TableResponse {
    pub code: String,
    /// seconds, `durations[i][j]` from `sources[i]` to `destinations[j]`
    pub durations: Vec<Vec<Option<f64>>>,
    /// meters, only with `annotations=duration,distance`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distances: Option<Vec<Vec<Option<f64>>>>,
    pub sources: Vec<Waypoint>,
    pub destinations: Vec<Waypoint>,
}

impl TableResponse {
    pub fn is_ok(&self) -> bool {
        self.code == "Ok"
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.sources.len(), self.destinations.len())
    }
}

fn check_matrix(what: &'static str, expected: (usize, usize), rows: &[Vec<Option<f64>>]) -> Result<(), ParseError> {
    if let Some(row) = rows.iter().find(|row| row.len() != expected.1) {
        return Err(ParseError::ShapeMismatch { what, expected, found: (rows.len(), row.len()) });
    }
    if rows.len() != expected.0 {
        let found_cols = rows.first().map_or(0, Vec::len);
        return Err(ParseError::ShapeMismatch { what, expected, found: (rows.len(), found_cols) });
    }
    Ok(())
}

impl ResponseSchema for TableResponse {
    const KIND: EndpointKind = EndpointKind::Table;

    fn code(&self) -> &str {
        &self.code
    }

    fn check_shape(&self) -> Result<(), ParseError> {
        let expected = self.shape();
        check_matrix("durations", expected, &self.durations)?;
        if let Some(distances) = &self.distances {
            check_matrix("distances", expected, distances)?;
        }
        Ok(())
    }
}
