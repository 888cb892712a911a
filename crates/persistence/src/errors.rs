use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("invalid Set-Cookie header: {0}")]
    InvalidHeader(String),
    #[error("encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

impl PersistenceError {
    pub fn invalid_config(msg: impl Into<String>) -> Self { Self::InvalidConfig(msg.into()) }
}
