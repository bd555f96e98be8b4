//! Errors for configuration and pipeline orchestration.
//!
//! [`PipelineError`] wraps the domain errors of the stages it runs
//! ([`MrioError`], [`StatsError`]) and adds the failures that only exist at
//! the orchestration level: an invalid configuration, an unreadable
//! configuration file, or a stage started before its inputs exist.
#[cfg(feature = "python-bindings")]
use pyo3::{PyErr, exceptions::PyValueError};

use crate::{mrio::errors::MrioError, statistics::errors::StatsError};

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// A numerical, label or persistence failure inside a stage.
    Mrio(MrioError),

    /// Retrieving or reducing national statistics failed.
    Stats(StatsError),

    /// A configuration value is out of range.
    InvalidConfig { field: &'static str, reason: String },

    /// The configuration file could not be read or parsed.
    ConfigFile { path: String, text: String },

    /// A stage needs an artifact that has not been produced yet.
    MissingArtifact { kind: &'static str, year: u16 },
}

impl From<MrioError> for PipelineError {
    fn from(err: MrioError) -> Self {
        PipelineError::Mrio(err)
    }
}

impl From<StatsError> for PipelineError {
    fn from(err: StatsError) -> Self {
        PipelineError::Stats(err)
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PipelineError::Mrio(err) => Some(err),
            PipelineError::Stats(err) => Some(err),
            _ => None,
        }
    }
}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineError::Mrio(err) => write!(f, "{err}"),
            PipelineError::Stats(err) => write!(f, "{err}"),
            PipelineError::InvalidConfig { field, reason } => {
                write!(f, "Pipeline Error: invalid config field '{field}': {reason}")
            }
            PipelineError::ConfigFile { path, text } => {
                write!(f, "Pipeline Error: cannot read config {path}: {text}")
            }
            PipelineError::MissingArtifact { kind, year } => {
                write!(f, "Pipeline Error: artifact '{kind}' for {year} has not been produced yet")
            }
        }
    }
}

#[cfg(feature = "python-bindings")]
impl From<PipelineError> for PyErr {
    fn from(err: PipelineError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}
