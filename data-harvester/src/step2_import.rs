use crate::step1_fetch::FetchStepOutput;
use common::types::dataset::{DatasetFormat, TripDataset};
use log::debug;
use polars::error::PolarsError;
use polars::prelude::{LazyCsvReader, LazyFileListReader, LazyFrame, ScanArgsParquet};
use std::fmt;
use std::fmt::Display;

/// Scans the fetched file lazily. CSV timestamps are parsed into datetimes where they look like
/// ones.
pub fn import_data(prev_step_out: FetchStepOutput) -> Result<ImportStepOutput, ImportError> {
    let FetchStepOutput { dataset, path } = prev_step_out;
    debug!(target: "harvest", "Importing {} as {:?}", path.display(), dataset.format);

    let frame = match dataset.format {
        DatasetFormat::Csv => LazyCsvReader::new(&path)
            .with_has_header(true)
            .with_try_parse_dates(true)
            .finish()?,
        DatasetFormat::Parquet => LazyFrame::scan_parquet(&path, ScanArgsParquet::default())?,
    };

    Ok(ImportStepOutput { dataset, frame })
}

#[derive(thiserror::Error, Debug)]
pub enum ImportError {
    Polars(#[from] PolarsError),
}

impl Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ImportError::Polars(err) => write!(f, "{}", err),
        }
    }
}

pub struct ImportStepOutput {
    pub dataset: TripDataset,
    pub frame: LazyFrame,
}
