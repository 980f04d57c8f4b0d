//! Error type shared by configuration, generation and the build pipeline.

use thiserror::Error;

use crate::terrain::BuildPhase;

/// Everything that can stop a terrain build.
///
/// Recoverable conditions are not represented here: a non-positive noise
/// scale is clamped, and a connector whose neighbours are missing is simply
/// not built.
#[derive(Debug, Error)]
pub enum TerrainError {
    #[error("invalid {what}: {value} ({reason})")]
    InvalidDimension {
        what: &'static str,
        value: usize,
        reason: &'static str,
    },

    #[error("invalid response curve: {0}")]
    InvalidCurve(String),

    #[error("invalid parameter {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    #[error("pipeline step expects phase {expected:?}, build is in {found:?}")]
    PhaseOrder {
        expected: BuildPhase,
        found: BuildPhase,
    },

    #[error("could not parse configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("could not read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T> = std::result::Result<T, TerrainError>;
