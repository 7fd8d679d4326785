//! Error kinds surfaced by the statistical core

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    #[error("Invalid analysis window: start {start} is after end {end}")]
    InvalidWindow {
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },

    #[error("Insufficient data: smallest contingency cell is {smallest}, every cell must exceed {required}")]
    InsufficientData { smallest: u64, required: u64 },

    #[error("Degenerate contingency table: {0}")]
    DegenerateContingency(String),

    #[error("No observations carry a value for {0}")]
    MissingField(String),

    #[error("Not a weather dimension: {0}")]
    NotWeatherDimension(String),

    #[error("Invalid month: {0}")]
    InvalidMonth(u32),
}

pub type CoreResult<T> = Result<T, CoreError>;
