mod archive;
mod config;
mod error;
mod forecast;
mod forecaster;
mod types;

pub use config::*;
pub use error::{ForecastError, ForecastStage};
pub use forecaster::Forecaster;

pub use archive::error::ArchiveError;
pub use archive::memory::MemoryArchive;
pub use archive::reader::*;

pub use forecast::aggregator::*;
pub use forecast::engine::*;
pub use forecast::runner::*;
pub use forecast::variation::*;
pub use forecast::writer::PredictionWriter;

pub use types::levels::PollutantLevels;
pub use types::pollutant::*;
pub use types::reading::*;
pub use types::representative::*;
pub use types::slot::*;
pub use types::slot_result::*;
