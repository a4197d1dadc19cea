//! Drives the engine over many locations.
//!
//! Locations are independent, so several are forecast concurrently; each one
//! still runs its days strictly in order with its own variation source and
//! representative list. A failing location is reported and never stops the
//! others, and files already written stay valid. A location without any
//! archive data still gets its full forecast of "NA" estimates.

use crate::archive::reader::Archive;
use crate::error::ForecastError;
use crate::forecast::engine::ForecastEngine;
use crate::forecast::writer::PredictionWriter;
use chrono::{DateTime, Utc};
use futures_util::stream::{self, StreamExt};
use log::{error, info, warn};
use std::path::PathBuf;

/// Locations forecast at the same time when nothing else is configured.
pub const DEFAULT_CONCURRENCY: usize = 4;

#[derive(Debug)]
pub enum LocationStatus {
    Written(PathBuf),
    Failed(ForecastError),
}

#[derive(Debug)]
pub struct LocationOutcome {
    pub location: String,
    pub status: LocationStatus,
}

/// Outcomes of a run, in the order the locations were given.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub outcomes: Vec<LocationOutcome>,
}

impl RunSummary {
    pub fn written(&self) -> usize {
        self.count(|s| matches!(s, LocationStatus::Written(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, LocationStatus::Failed(_)))
    }

    fn count(&self, predicate: impl Fn(&LocationStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| predicate(&o.status)).count()
    }

    /// Logs a one-line summary; the level reflects how many locations failed.
    pub fn log(&self) {
        let total = self.outcomes.len();
        let failed = self.failed();
        let message = format!(
            "Forecast run complete: {}/{} written, {} failed",
            self.written(),
            total,
            failed
        );
        if failed == 0 {
            info!("{}", message);
        } else if failed == total {
            error!("{}", message);
        } else {
            warn!("{}", message);
        }
    }
}

pub struct ForecastRunner<'a, A> {
    engine: &'a ForecastEngine<A>,
    writer: &'a PredictionWriter,
    concurrency: usize,
}

impl<'a, A: Archive> ForecastRunner<'a, A> {
    pub fn new(
        engine: &'a ForecastEngine<A>,
        writer: &'a PredictionWriter,
        concurrency: usize,
    ) -> Self {
        Self {
            engine,
            writer,
            concurrency: concurrency.max(1),
        }
    }

    pub async fn run(&self, locations: &[String], reference: DateTime<Utc>) -> RunSummary {
        let outcomes = stream::iter(locations)
            .map(|location| self.run_location(location, reference))
            .buffered(self.concurrency)
            .collect::<Vec<_>>()
            .await;
        RunSummary { outcomes }
    }

    pub async fn run_location(&self, location: &str, reference: DateTime<Utc>) -> LocationOutcome {
        info!("Processing {}...", location);
        let status = match self.engine.forecast(location, reference).await {
            Ok(results) => {
                if results.iter().all(|r| r.levels.is_empty()) {
                    warn!("No archive data for {}, every estimate is NA", location);
                }
                match self.writer.write(location, &results).await {
                    Ok(path) => {
                        info!("Saved predictions for {} to {}", location, path.display());
                        LocationStatus::Written(path)
                    }
                    Err(e) => {
                        error!("Saving predictions for {} failed: {}", location, e);
                        LocationStatus::Failed(e)
                    }
                }
            }
            Err(e) => {
                error!("{}", e);
                LocationStatus::Failed(e)
            }
        };
        LocationOutcome {
            location: location.to_string(),
            status,
        }
    }
}
