//! Errors raised by the pipeline stages.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Input file '{0}' not found")]
    MissingInput(PathBuf, #[source] std::io::Error),

    #[error("Input file '{path}' is malformed: {message}")]
    MalformedInput { path: PathBuf, message: String },

    #[error("Failed to write '{0}'")]
    OutputWrite(PathBuf, #[source] std::io::Error),

    #[error("Timestamp station '{0}' is on the exclusion list")]
    CanonicalStationExcluded(String),

    #[error("Feature '{feature}' is missing from {context}")]
    MissingFeature { feature: String, context: String },

    #[error("Station '{station}' has no '{feature}' series in {context}")]
    MissingStation {
        feature: String,
        station: String,
        context: String,
    },

    #[error("Series '{feature}' / '{station}' has zero variance and cannot be normalized")]
    ZeroVariance { feature: String, station: String },

    #[error("Series '{feature}' / '{station}' is empty")]
    EmptySeries { feature: String, station: String },

    #[error("Region {0} has no grid cells assigned to it")]
    EmptyRegion(usize),

    #[error("Field shape {found:?} does not match the region map shape {expected:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("Invalid configuration: {0}")]
    Config(String),
}
