//! Error types for rasterization and rendering operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for rasterization and rendering operations.
pub type RasterResult<T> = Result<T, RasterError>;

/// Errors that can occur while loading, classifying, or rendering leaf data.
#[derive(Debug, Error)]
pub enum RasterError {
    /// A leaf CSV row failed to parse. Fatal to the whole load.
    #[error("malformed leaf record at row {line}: {message}")]
    MalformedRecord {
        /// Zero-based row index of the offending record.
        line: usize,
        /// Description of what failed to parse.
        message: String,
    },

    /// Unknown aggregation operator.
    #[error("unknown aggregation op '{name}' (expected 'max' or 'mean')")]
    UnknownOp {
        /// The operator name that was not recognized.
        name: String,
    },

    /// Unknown band preset name.
    #[error("unknown band preset '{name}' (known presets: {known})")]
    UnknownPreset {
        /// The preset name that was not recognized.
        name: String,
        /// Comma-separated list of known preset names.
        known: String,
    },

    /// Unknown colormap name.
    #[error("unknown colormap '{name}' (supported: {supported})")]
    UnknownColormap {
        /// The colormap name that was not recognized.
        name: String,
        /// Comma-separated list of supported colormap names.
        supported: String,
    },

    /// Band boundaries must be non-decreasing.
    #[error("band boundaries are not non-decreasing at index {index}")]
    NonMonotonicBoundaries {
        /// Index of the first boundary that is smaller than its predecessor.
        index: usize,
    },

    /// Band spec needs at least two boundaries.
    #[error("band spec needs at least 2 boundaries, got {count}")]
    TooFewBoundaries {
        /// Number of boundaries provided.
        count: usize,
    },

    /// Label count must be boundary count minus one.
    #[error("band spec has {labels} labels for {bands} bands")]
    LabelCountMismatch {
        /// Number of labels provided.
        labels: usize,
        /// Number of bands implied by the boundaries.
        bands: usize,
    },

    /// Overlay blend weight outside `[0, 1]`.
    #[error("alpha must be in [0, 1], got {value}")]
    AlphaOutOfRange {
        /// The rejected alpha value.
        value: f64,
    },

    /// Grid extent and cell data disagree (or an extent is zero).
    #[error("invalid grid shape: {width}x{height} with {cells} cells")]
    InvalidGridShape {
        /// Declared grid width.
        width: usize,
        /// Declared grid height.
        height: usize,
        /// Number of cell values actually present.
        cells: usize,
    },

    /// No depth can be resolved from an empty leaf table.
    #[error("cannot resolve a depth from an empty leaf table")]
    EmptyInput,

    /// Leaf CSV file not found.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Path that was not found.
        path: PathBuf,
    },

    /// I/O error from the standard library.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to write an export file.
    #[error("failed to write to {path}: {source}")]
    IoWrite {
        /// The path that failed.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}
