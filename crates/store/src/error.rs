//! Error types for the persistence layer.

use std::path::PathBuf;

use snafu::{Location, Snafu};

/// Result type for store operations.
pub type Result<T, E = StoreError> = std::result::Result<T, E>;

/// Errors from reading or writing a durable store file.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum StoreError {
    /// Filesystem I/O failed.
    #[snafu(display("I/O error on {path:?} at {location}: {source}"))]
    Io {
        /// File the operation targeted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
        /// Source location.
        #[snafu(implicit)]
        location: Location,
    },

    /// Serializing the document to JSON failed.
    #[snafu(display("serialization error for {path:?} at {location}: {source}"))]
    Serialize {
        /// File the document belongs to.
        path: PathBuf,
        /// Underlying serde error.
        source: serde_json::Error,
        /// Source location.
        #[snafu(implicit)]
        location: Location,
    },
}
