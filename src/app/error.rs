use thiserror::Error;

#[derive(Error, Debug)]
pub enum PageturnError {
    #[error("no API key configured")]
    Unauthenticated,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("GraphQL errors: {}", .0.join("; "))]
    GraphQL(Vec<String>),

    #[error("missing field {field}, tried keys {tried:?}")]
    MissingField { field: &'static str, tried: Vec<String> },

    #[error("decode error: {0}")]
    Decode(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, PageturnError>;
