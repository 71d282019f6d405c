use crate::types::config::OutputFormat;
use geoarrow::error::GeoArrowError;
use geoarrow::io::ipc::write_ipc;
use geoarrow::table::Table;
use itertools::Itertools;
use polars::datatypes::DataType;
use polars::error::{PolarsError, PolarsResult};
use polars::frame::DataFrame;
use polars::io::SerWriter;
use polars::prelude::{CsvWriter, IpcWriter, ParquetWriter};
use std::fs::{create_dir_all, File};
use std::path::PathBuf;

/// Reads a numeric column as floats. Nulls become NaN so that row alignment is never lost.
pub fn f64_values(frame: &DataFrame, name: &str) -> PolarsResult<Vec<f64>> {
    let column = frame.column(name)?.cast(&DataType::Float64)?;
    let values = column.f64()?
        .iter()
        .map(|value| value.unwrap_or(f64::NAN))
        .collect_vec();

    Ok(values)
}

/// Splits a frame into contiguous slices of at most `rows_per_slice` rows, in row order
pub fn slices(frame: &DataFrame, rows_per_slice: usize) -> Vec<(usize, DataFrame)> {
    let rows_per_slice = rows_per_slice.max(1);

    (0..frame.height())
        .step_by(rows_per_slice)
        .map(|offset| (offset, frame.slice(offset as i64, rows_per_slice)))
        .collect()
}

pub fn write_df_to_file(
    path: PathBuf,
    format: OutputFormat,
    mut df: DataFrame
) -> Result<(), PolarsError> {
    let mut file = prepare_file(path)?;

    match format {
        OutputFormat::Csv => {
            CsvWriter::new(&mut file).finish(&mut df)?;
            Ok(())
        },
        OutputFormat::Ipc => {
            IpcWriter::new(&mut file).finish(&mut df)?;
            Ok(())
        },
        OutputFormat::Parquet => {
            ParquetWriter::new(&mut file).finish(&mut df)?;
            Ok::<(), PolarsError>(())
        },
    }?;

    Ok(())
}

/// Writes a GeoArrow table as Arrow IPC, the format map renderers read directly
pub fn write_geoarrow_to_file(
    path: PathBuf,
    table: Table
) -> Result<(), GeoArrowError> {
    let file = prepare_file(path)?;

    write_ipc(table.into_record_batch_reader(), file)?;

    Ok(())
}


fn prepare_file(
    path: PathBuf,
) -> Result<File, std::io::Error> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }

    let file = File::create(path)?;

    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::df;
    use polars::prelude::{IpcReader, SerReader};

    #[test]
    fn test_f64_values_keeps_nulls_as_nan() {
        let frame = df!(
            "lon" => &[Some(1.5f32), None, Some(-3.0)],
        ).unwrap();

        let values = f64_values(&frame, "lon").unwrap();
        assert_eq!(values.len(), 3);
        assert_eq!(values[0], 1.5);
        assert!(values[1].is_nan());
        assert_eq!(values[2], -3.0);

        assert!(f64_values(&frame, "lat").is_err());
    }

    #[test]
    fn test_slices() {
        let frame = df!(
            "id" => &[0u32, 1, 2, 3, 4],
        ).unwrap();

        let slices = slices(&frame, 2);
        let offsets = slices.iter().map(|(offset, _)| *offset).collect_vec();
        let heights = slices.iter().map(|(_, slice)| slice.height()).collect_vec();
        assert_eq!(offsets, vec![0, 2, 4]);
        assert_eq!(heights, vec![2, 2, 1]);

        assert!(super::slices(&DataFrame::empty(), 2).is_empty());
    }

    #[test]
    fn test_write_ipc() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out.arrow");
        let frame = df!(
            "id" => &[0u32, 1],
            "route_meters" => &[Some(12.5f64), None],
        ).unwrap();

        write_df_to_file(path.clone(), OutputFormat::Ipc, frame.clone()).unwrap();

        let read = IpcReader::new(File::open(path).unwrap()).finish().unwrap();
        assert!(read.equals_missing(&frame));
    }
}
