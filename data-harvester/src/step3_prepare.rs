use crate::step2_import::ImportStepOutput;
use common::types::dataset::{PrepareConfig, TripDataset};
use log::info;
use polars::error::PolarsError;
use polars::frame::DataFrame;
use polars::prelude::{col, lit, DataType, LazyFrame};
use std::fmt;
use std::fmt::Display;

pub const PICKUP_DATETIME: &str = "pickup_datetime";
pub const DROPOFF_DATETIME: &str = "dropoff_datetime";
pub const PICKUP_LATITUDE: &str = "pickup_latitude";
pub const DROPOFF_LATITUDE: &str = "dropoff_latitude";
pub const TRIP_DISTANCE: &str = "trip_distance";

const METERS_PER_MILE: f64 = 1609.34;

/// Selects the trips to route and materializes them
pub fn prepare(prev_step_out: ImportStepOutput) -> Result<PrepareStepOutput, PrepareError> {
    let ImportStepOutput { dataset, frame } = prev_step_out;

    let frame = select_trips(frame, &dataset.prepare).collect()?;
    info!(target: "harvest", "Prepared {} trip(s) from dataset '{}'", frame.height(), dataset.id);

    Ok(PrepareStepOutput { dataset, frame })
}

fn select_trips(frame: LazyFrame, config: &PrepareConfig) -> LazyFrame {
    let mut frame = frame.filter(
        col(PICKUP_LATITUDE).is_not_null().and(col(DROPOFF_LATITUDE).is_not_null())
    );

    if let Some(instant) = config.spanning {
        frame = frame.filter(
            col(PICKUP_DATETIME).lt(lit(instant)).and(col(DROPOFF_DATETIME).gt(lit(instant)))
        );
    }

    if config.derive_ground_truth {
        frame = frame.with_columns([
            (col(TRIP_DISTANCE).cast(DataType::Float64) * lit(METERS_PER_MILE)).alias("trip_meters"),
            (col(DROPOFF_DATETIME) - col(PICKUP_DATETIME)).dt().total_seconds().alias("trip_seconds"),
        ]);
    }

    match config.limit {
        Some(limit) => frame.limit(limit),
        None => frame,
    }
}

#[derive(thiserror::Error, Debug)]
pub enum PrepareError {
    Polars(#[from] PolarsError),
}

impl Display for PrepareError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PrepareError::Polars(err) => write!(f, "{}", err),
        }
    }
}

pub struct PrepareStepOutput {
    pub dataset: TripDataset,
    pub frame: DataFrame,
}
