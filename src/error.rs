use thiserror::Error;

#[derive(Error, Debug)]
pub enum GndError {
    /// The backend answered with a non-success HTTP status.
    #[error("request to {url} failed with status {status}")]
    Network { url: String, status: u16 },

    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("could not parse config: {0}")]
    Config(#[from] toml::de::Error),

    #[error("invalid URL {0}")]
    InvalidUrl(String),

    #[error("invalid index range: {0}")]
    InvalidRange(String),

    /// No request block remains at the current fetch position.
    #[error("no more request blocks to fetch")]
    Exhausted,

    #[error("a render batch is already in progress")]
    BatchInProgress,

    #[error("no search has been started")]
    NoActiveSearch,
}

pub type Result<T> = std::result::Result<T, GndError>;
