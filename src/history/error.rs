use thiserror::Error;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("Failed to build HTTP client for the air quality service")]
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

    #[error("Failed to parse air quality response")]
    JsonParse(#[from] serde_json::Error),
}
