// THEORY:
// A single error enum covers the whole crate. Engine failures (`InvalidImage`,
// `Cancelled`, `WorkerFailed`) abort an aggregation outright, while
// `InvalidInput` is the user-facing class: a bad number typed into a field or a
// species nobody mapped. Callers surface those and keep going.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the avian_raster library.
#[derive(Error, Debug)]
pub enum Error {
    /// The image has no area to aggregate over.
    #[error("invalid image dimensions {width}x{height}: width and height must both be at least 1")]
    InvalidImage { width: u32, height: u32 },

    /// A user-supplied value could not be used.
    #[error("{0}")]
    InvalidInput(String),

    /// Aggregation was aborted through a `CancelToken`.
    #[error("color aggregation was cancelled")]
    Cancelled,

    /// A band task panicked or could not be joined.
    #[error("band worker failed: {0}")]
    WorkerFailed(String),

    /// Failed to load an image file.
    #[error("failed to load image from {path}: {source}")]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Failed to save an image file.
    #[error("failed to save image to {path}: {source}")]
    ImageSave {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// The worker pool runtime could not be started.
    #[error("failed to start worker pool")]
    Runtime(#[source] std::io::Error),

    /// Configuration values are out of range.
    #[error("invalid configuration: {reason}")]
    Config { reason: String },

    /// A configuration file could not be read, parsed or written.
    #[error("configuration file {path}: {reason}")]
    ConfigFile { path: PathBuf, reason: String },
}

impl Error {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }

    /// True for errors caused by what the user typed or selected. These are
    /// reported and the session continues.
    pub fn is_user_error(&self) -> bool {
        matches!(self, Error::InvalidInput(_))
    }
}

/// Result type alias for avian_raster operations.
pub type Result<T> = std::result::Result<T, Error>;
