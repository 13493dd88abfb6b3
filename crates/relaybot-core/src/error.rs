use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid model catalog: {0}")]
    Catalog(String),
}

pub type Result<T> = std::result::Result<T, RelayError>;
