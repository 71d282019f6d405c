use crate::schema::TableResponse;
use ndarray::{Array2, ShapeError};
use std::fmt;
use std::fmt::Display;

/// `m[[i, j]]` is the cost from point i to point j. `None` where the engine found no route.
pub type CostMatrix = Array2<Option<f64>>;

/// Durations in seconds. Not symmetric in general, and the diagonal is whatever the engine
/// reported.
pub fn extract_durations(table: &TableResponse) -> Result<CostMatrix, MatrixError> {
    to_matrix(&table.durations)
}

/// Distances in meters, if they were requested
pub fn extract_distances(table: &TableResponse) -> Result<Option<CostMatrix>, MatrixError> {
    table.distances.as_deref().map(to_matrix).transpose()
}

fn to_matrix(rows: &[Vec<Option<f64>>]) -> Result<CostMatrix, MatrixError> {
    let n = rows.len();
    if let Some(row) = rows.iter().find(|row| row.len() != n) {
        return Err(MatrixError::NotSquare { rows: n, columns: row.len() });
    }

    let cells = rows.iter().flatten().copied().collect();
    Ok(Array2::from_shape_vec((n, n), cells)?)
}

/// Renders a matrix as a boxed grid, for logs
pub struct Grid<'a>(pub &'a CostMatrix);

impl Display for Grid<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let cells = self.0.map(|cell| match cell {
            Some(value) => format!("{value:.1}"),
            None => "-".to_string(),
        });
        let width = cells.iter().map(String::len).max().unwrap_or(1);
        let separator = format!("+{}", format!("{}+", "-".repeat(width + 2)).repeat(self.0.ncols()));

        writeln!(f, "{separator}")?;
        for row in cells.rows() {
            write!(f, "|")?;
            for cell in row {
                write!(f, " {cell:>width$} |")?;
            }
            writeln!(f)?;
            writeln!(f, "{separator}")?;
        }
        Ok(())
    }
}

#[derive(thiserror::Error, Debug)]
pub enum MatrixError {
    NotSquare { rows: usize, columns: usize },
    Shape(#[from] ShapeError),
}

impl Display for MatrixError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MatrixError::NotSquare { rows, columns } => {
                write!(f, "Matrix with {rows} rows has a row of {columns} columns")
            }
            MatrixError::Shape(err) => write!(f, "{err}"),
        }
    }
}
