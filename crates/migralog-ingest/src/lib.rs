//! Input adapters feeding the statistical core
//!
//! Parses symptom log exports, loads daily weather for the analysis window
//! and resolves postal codes to coordinates.

pub mod geocode;
pub mod iheadache;
#[cfg(feature = "meteostat")]
pub mod meteostat;
pub mod weather_csv;

pub use geocode::*;
pub use iheadache::*;
#[cfg(feature = "meteostat")]
pub use meteostat::*;
pub use weather_csv::*;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Missing header line: {0}")]
    MissingHeader(&'static str),

    #[error("Invalid date {value:?}: {source}")]
    InvalidDate {
        value: String,
        source: chrono::ParseError,
    },

    #[error("Invalid analysis window: {0}")]
    Window(#[from] migralog_core::CoreError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unknown postal code: {0}")]
    UnknownPostalCode(String),

    #[error("Communication error: {0}")]
    CommunicationError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout waiting for data")]
    Timeout,
}

pub type IngestResult<T> = Result<T, IngestError>;
