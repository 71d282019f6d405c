use crate::assembler::AssembleError;
use crate::batcher::InputMismatch;
use crate::locator::LocatorError;
use polars::error::PolarsError;
use std::fmt;
use std::fmt::Display;

/// Failures that abort a whole batch. Failures of single rows are carried in the data instead.
#[derive(thiserror::Error, Debug)]
pub enum DispatchError {
    Polars(#[from] PolarsError),
    Input(#[from] InputMismatch),
    Assemble(#[from] AssembleError),
    Locator(#[from] LocatorError),
}

impl Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let err: &dyn Display = match self {
            DispatchError::Polars(err) => err,
            DispatchError::Input(err) => err,
            DispatchError::Assemble(err) => err,
            DispatchError::Locator(err) => err,
        };
        write!(f, "{}", err)
    }
}
