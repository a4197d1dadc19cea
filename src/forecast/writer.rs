use crate::error::ForecastError;
use crate::types::slot_result::SlotResult;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::Builder;
use tokio::{fs, task};

/// Writes one JSON file per location into an output directory.
///
/// Files are written to a uniquely named temporary sibling and persisted over
/// the target, so a reader never observes a half-written forecast.
#[derive(Debug, Clone)]
pub struct PredictionWriter {
    output_dir: PathBuf,
}

impl PredictionWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn path_for(&self, location: &str) -> PathBuf {
        self.output_dir.join(format!("{}.json", location))
    }

    /// Serializes `results` as a pretty-printed JSON array and stores it at
    /// [`PredictionWriter::path_for`], replacing any previous forecast.
    pub async fn write(
        &self,
        location: &str,
        results: &[SlotResult],
    ) -> Result<PathBuf, ForecastError> {
        let json =
            serde_json::to_string_pretty(results).map_err(|e| ForecastError::Serialize {
                location: location.to_string(),
                source: e,
            })?;

        fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| ForecastError::OutputDir(self.output_dir.clone(), e))?;

        let path = self.path_for(location);
        let output_dir = self.output_dir.clone();
        let target = path.clone();
        let prefix = format!(".{}.", location);
        task::spawn_blocking(move || {
            // Dropped (and removed) on any error below.
            let mut staging = Builder::new()
                .prefix(&prefix)
                .suffix(".tmp")
                .tempfile_in(&output_dir)
                .map_err(|e| ForecastError::OutputWrite(output_dir.clone(), e))?;
            staging
                .write_all(json.as_bytes())
                .map_err(|e| ForecastError::OutputWrite(staging.path().to_path_buf(), e))?;
            staging
                .persist(&target)
                .map_err(|e| ForecastError::OutputWrite(target.clone(), e.error))?;
            Ok::<(), ForecastError>(())
        })
        .await??;
        Ok(path)
    }
}
