//! The Archive Reader: resolves `(location, date, hour)` to a [`Reading`] or absence.
//!
//! Records live at `{base}/{location}/{YYYYMMDD}_{HH}0000.json`. Every read is
//! independent: no caching, and retries only when explicitly configured.

use crate::archive::error::ArchiveError;
use crate::types::reading::Reading;
use bon::bon;
use chrono::NaiveDate;
use log::{debug, warn};
use reqwest::{Client, StatusCode};
use std::future::Future;
use std::time::Duration;

/// Timeout applied to a single archive request when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Delay before the first retry; doubled on every further attempt.
pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_millis(500);

/// Read access to the hourly pollutant archive.
///
/// Implementations must never fail: anything that prevents a reading from
/// being returned (transport error, timeout, bad status, malformed payload)
/// is reported as `None`.
pub trait Archive: Sync {
    fn fetch(
        &self,
        location: &str,
        date: NaiveDate,
        hour: u32,
    ) -> impl Future<Output = Option<Reading>> + Send;
}

/// Canonical archive key of one hourly record, relative to the archive base.
///
/// # Examples
///
/// ```
/// use aqi_slotcast::archive_key;
/// use chrono::NaiveDate;
///
/// let date = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
/// assert_eq!(archive_key("Colaba_Mumbai_-_MPCB", date, 7), "Colaba_Mumbai_-_MPCB/20250106_070000.json");
/// ```
pub fn archive_key(location: &str, date: NaiveDate, hour: u32) -> String {
    format!("{}/{}_{:02}0000.json", location, date.format("%Y%m%d"), hour)
}

/// [`Archive`] backed by a static HTTP file tree.
pub struct HttpArchive {
    base_url: String,
    client: Client,
    retries: u32,
    retry_backoff: Duration,
}

#[bon]
impl HttpArchive {
    /// Creates an archive client rooted at `base_url`.
    ///
    /// # Arguments
    ///
    /// * `.base_url(impl Into<String>)`: **Required.** Root of the archive tree; a trailing `/` is ignored.
    /// * `.timeout(Duration)`: Optional. Per-request timeout, defaults to [`DEFAULT_TIMEOUT`]. An expired request counts as absent.
    /// * `.retries(u32)`: Optional. Extra attempts after a transient failure, defaults to `0`.
    /// * `.retry_backoff(Duration)`: Optional. Initial retry delay, defaults to [`DEFAULT_RETRY_BACKOFF`].
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::ClientBuild`] if the HTTP client cannot be constructed.
    ///
    /// # Examples
    ///
    /// ```
    /// use aqi_slotcast::HttpArchive;
    /// use std::time::Duration;
    ///
    /// let archive = HttpArchive::builder()
    ///     .base_url("https://example.org/output/")
    ///     .timeout(Duration::from_secs(5))
    ///     .retries(2)
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(archive.base_url(), "https://example.org/output");
    /// ```
    #[builder]
    pub fn new(
        #[builder(into)] base_url: String,
        timeout: Option<Duration>,
        retries: Option<u32>,
        retry_backoff: Option<Duration>,
    ) -> Result<Self, ArchiveError> {
        let client = Client::builder()
            .timeout(timeout.unwrap_or(DEFAULT_TIMEOUT))
            .build()
            .map_err(ArchiveError::ClientBuild)?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            retries: retries.unwrap_or(0),
            retry_backoff: retry_backoff.unwrap_or(DEFAULT_RETRY_BACKOFF),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url_for(&self, location: &str, date: NaiveDate, hour: u32) -> String {
        format!("{}/{}", self.base_url, archive_key(location, date, hour))
    }

    /// Reads one record, retrying transient failures up to the configured limit.
    pub async fn try_fetch(
        &self,
        location: &str,
        date: NaiveDate,
        hour: u32,
    ) -> Result<Reading, ArchiveError> {
        let url = self.url_for(location, date, hour);
        let mut attempt = 0;
        loop {
            match self.fetch_once(&url).await {
                Ok(reading) => return Ok(reading),
                Err(e) if e.is_transient() && attempt < self.retries => {
                    let delay = self
                        .retry_backoff
                        .saturating_mul(2u32.saturating_pow(attempt));
                    attempt += 1;
                    debug!(
                        "Attempt {} for {} failed ({}), retrying in {:?}",
                        attempt, url, e, delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn fetch_once(&self, url: &str) -> Result<Reading, ArchiveError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ArchiveError::NetworkRequest(url.to_string(), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ArchiveError::HttpStatus {
                url: url.to_string(),
                status,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| ArchiveError::NetworkRequest(url.to_string(), e))?;
        Reading::from_json(&body).map_err(|e| ArchiveError::JsonParse {
            url: url.to_string(),
            source: e,
        })
    }
}

impl Archive for HttpArchive {
    async fn fetch(&self, location: &str, date: NaiveDate, hour: u32) -> Option<Reading> {
        match self.try_fetch(location, date, hour).await {
            Ok(reading) => Some(reading),
            // Hours the logger never wrote are common, not worth a warning.
            Err(ArchiveError::HttpStatus { url, status }) if status == StatusCode::NOT_FOUND => {
                debug!("No archive record at {}", url);
                None
            }
            Err(e) => {
                warn!(
                    "Archive read for {} on {} at {:02}:00 treated as absent: {}",
                    location, date, hour, e
                );
                None
            }
        }
    }
}
