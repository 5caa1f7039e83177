use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Failed to encode cache entry")]
    Encode(#[source] bincode::error::EncodeError),

    #[error("Failed to decode cache entry '{key}'")]
    Decode {
        key: String,
        #[source]
        source: bincode::error::DecodeError,
    },

    #[error("Cache backend error: {0}")]
    Backend(String),
}
