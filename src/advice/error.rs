use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdviceError {
    #[error("Failed to build HTTP client for the chat service")]
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

    #[error("Failed to parse chat completion response")]
    JsonParse(#[from] serde_json::Error),

    #[error("Chat completion response contained no choices")]
    EmptyCompletion,
}
