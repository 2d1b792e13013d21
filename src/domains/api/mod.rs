//! API call domain.
//!
//! Everything between a validated request and the text handed back to the
//! caller:
//!
//! - `executor` - performs the HTTP call (`RequestExecutor`, `HttpExecutor`)
//! - `normalizer` - turns outcomes into `CanonicalResult` records
//! - `csv` - CSV projection of a `CanonicalResult`
//! - `error_log` - append-only failure log
//! - `model` - shared request/result types

pub mod csv;
pub mod error_log;
pub mod executor;
pub mod model;
pub mod normalizer;

pub use csv::to_csv;
pub use error_log::ErrorLogger;
pub use executor::{HttpExecutor, RequestExecutor, RequestFailure, RequestSuccess};
pub use model::{ApiRequest, CanonicalResult, HttpMethod, OutputFormat, RawResponse};
pub use normalizer::{UNKNOWN_ERROR, normalize_failure, normalize_success};
