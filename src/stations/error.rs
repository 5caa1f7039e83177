use thiserror::Error;

/// Errors raised while retrieving the monitoring network feed.
///
/// Every variant means the upstream feed is unavailable for this query: the
/// request failed, returned a non-success status, or the body was not a feed
/// document at all. Problems confined to individual stations are not errors;
/// those stations are dropped during parsing.
#[derive(Debug, Error)]
pub enum StationFeedError {
    #[error("Failed to build HTTP client for the station feed")]
    ClientBuild(#[source] reqwest::Error),

    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        #[source]
        source: reqwest::Error,
    },

    #[error("Station feed payload is malformed")]
    MalformedPayload(#[source] serde_xml_rs::Error),

    // Covers errors joining the blocking parse task
    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}
