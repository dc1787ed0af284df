use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("invalid comments URL {url}: {message}")]
    InvalidUrl { url: String, message: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("comment API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
