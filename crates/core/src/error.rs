use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum FilterError {
    #[error("invalid price range: min {min} is greater than max {max}")]
    InvertedPriceRange { min: f64, max: f64 },

    #[error("invalid price bound: {0}")]
    InvalidPriceBound(f64),

    #[error("minimum rating must be within 0..=5, got {0}")]
    InvalidRating(f64),

    #[error("unknown sort policy: {0}")]
    UnknownSort(String),

    #[error("unknown roast level: {0}")]
    UnknownRoastLevel(String),
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("invalid response from {backend}: {details}")]
    BackendResponse { backend: String, details: String },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("serialize error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("search request failed: {0}")]
    Request(String),

    #[error("{collaborator} did not answer before the deadline")]
    DeadlineExceeded { collaborator: String },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialize error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("blob store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("catalog parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration error: {0}")]
    Figment(#[from] Box<figment::Error>),

    #[error("invalid endpoint {endpoint}: {source}")]
    Endpoint {
        endpoint: String,
        source: url::ParseError,
    },
}

impl From<figment::Error> for ConfigError {
    fn from(value: figment::Error) -> Self {
        Self::Figment(Box::new(value))
    }
}

pub type Result<T, E = SearchError> = std::result::Result<T, E>;
