use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeskError {
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("FT API answered {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Missing setting: {0}")]
    MissingSetting(&'static str),

    #[error("Redis error: {0}")]
    Redis(String),

    #[error("Telegram error: {0}")]
    Telegram(String),
}

impl From<bb8_redis::redis::RedisError> for DeskError {
    fn from(e: bb8_redis::redis::RedisError) -> Self {
        DeskError::Redis(e.to_string())
    }
}

impl From<bb8_redis::bb8::RunError<bb8_redis::redis::RedisError>> for DeskError {
    fn from(e: bb8_redis::bb8::RunError<bb8_redis::redis::RedisError>) -> Self {
        DeskError::Redis(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DeskError>;

/// Failures of the mock banking backend, mapped to HTTP statuses by the controllers.
#[derive(Debug, Error, PartialEq)]
pub enum BankError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("Access to this resource is not allowed")]
    Forbidden,

    #[error("{0}")]
    Rejected(String),
}
