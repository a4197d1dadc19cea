use thiserror::Error;

/// Failures of a single archive read.
///
/// These never reach the forecast engine: [`crate::Archive::fetch`] reports
/// them as an absent reading after logging.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Failed to build HTTP client for archive")]
    ClientBuild(#[source] reqwest::Error),

    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("Failed to parse archive payload from {url}")]
    JsonParse {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ArchiveError {
    /// Whether another attempt could plausibly succeed.
    ///
    /// Transport failures (including timeouts) and server errors are retried;
    /// a 4xx status or a malformed body is a definitive answer.
    pub fn is_transient(&self) -> bool {
        match self {
            ArchiveError::NetworkRequest(..) => true,
            ArchiveError::HttpStatus { status, .. } => status.is_server_error(),
            ArchiveError::ClientBuild(_) | ArchiveError::JsonParse { .. } => false,
        }
    }
}
