use crate::archive::error::ArchiveError;
use crate::types::slot::SlotTableError;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// The step of a location's run that a configuration error was detected in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForecastStage {
    Location,
    Calendar,
    SlotTable,
}

impl fmt::Display for ForecastStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ForecastStage::Location => write!(f, "location"),
            ForecastStage::Calendar => write!(f, "calendar"),
            ForecastStage::SlotTable => write!(f, "slot table"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ForecastError {
    /// Unrecoverable for one location; other locations keep running.
    #[error("Forecast for location '{location}' aborted at {stage} stage: {message}")]
    Config {
        location: String,
        stage: ForecastStage,
        message: String,
    },

    #[error("Invalid forecast setting '{field}': {message}")]
    InvalidSettings {
        field: &'static str,
        message: String,
    },

    #[error(transparent)]
    SlotTable(#[from] SlotTableError),

    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error("Failed to read config file '{0}'")]
    ConfigRead(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse config file '{0}'")]
    ConfigParse(PathBuf, #[source] toml::de::Error),

    #[error("Failed to create output directory '{0}'")]
    OutputDir(PathBuf, #[source] std::io::Error),

    #[error("Failed to write forecast file '{0}'")]
    OutputWrite(PathBuf, #[source] std::io::Error),

    #[error("Background task failed")]
    TaskJoin(#[from] tokio::task::JoinError),

    #[error("Failed to serialize forecast for location '{location}'")]
    Serialize {
        location: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ForecastError {
    pub(crate) fn config(
        location: &str,
        stage: ForecastStage,
        message: impl Into<String>,
    ) -> Self {
        ForecastError::Config {
            location: location.to_string(),
            stage,
            message: message.into(),
        }
    }
}
