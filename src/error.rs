//! Error types for the playlist pipeline.

use thiserror::Error;

/// Result type used throughout the pipeline.
pub type Result<T> = std::result::Result<T, Error>;

/// Pipeline errors.
///
/// The pipeline fails fast: both kinds describe permanent problems
/// with the call (bad input or bad parameters), never transient ones,
/// so callers should not retry.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed or missing input data, e.g. an unparseable timestamp
    /// or a dataset too degenerate for a quality metric.
    #[error("invalid data: {0}")]
    Data(String),

    /// Invalid parameters, e.g. a cluster count larger than the
    /// number of distinct feature points.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    pub fn data(msg: impl Into<String>) -> Self {
        Self::Data(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
