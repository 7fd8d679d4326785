//! Statistical association engine for symptom logs
//!
//! This crate turns a list of dated events plus daily weather observations
//! into per-period counts, 2x2 contingency tables and hypothesis tests.
//! Everything here is synchronous and free of I/O; parsing, fetching and
//! rendering live behind the traits in [`pipeline`].

pub mod aggregate;
pub mod classify;
pub mod config;
pub mod contingency;
pub mod error;
pub mod pipeline;
pub mod report;
pub mod significance;
pub mod stats;
pub mod store;
pub mod types;

pub use aggregate::*;
pub use classify::*;
pub use config::*;
pub use contingency::*;
pub use error::*;
pub use pipeline::*;
pub use report::*;
pub use significance::*;
pub use store::*;
pub use types::*;
