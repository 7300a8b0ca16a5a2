use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::record::{BottleId, SystemId};

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("bottle registry is empty")]
    EmptyRegistry,
    #[error("bottle {0} appears more than once in the registry")]
    DuplicateBottle(BottleId),
    #[error("system {0} has no records")]
    EmptySystem(SystemId),
    #[error("system {0} has no usable calibration")]
    NoCalibration(SystemId),
    #[error("requested file not found: {0}")]
    FileNotFound(PathBuf),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// The pipeline stage at which a system batch failed
///
/// Later stages drop individual records instead of failing. A system without any usable
/// coefficient fails at correction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Extraction,
    Correction,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Extraction => "extraction",
            Self::Correction => "correction",
        };
        f.write_str(name)
    }
}

/// A failure that aborted one system's batch
#[derive(Debug, Error)]
#[error("system {system_id} failed during {stage}: {source}")]
pub struct BatchError {
    pub system_id: SystemId,
    pub stage: Stage,
    #[source]
    pub source: Error,
}

impl BatchError {
    pub(crate) const fn new(system_id: SystemId, stage: Stage, source: Error) -> Self {
        Self {
            system_id,
            stage,
            source,
        }
    }
}
